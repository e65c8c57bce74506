#![allow(missing_docs)]

//! Cancellation contexts, deadlines and combinators through the public API.

#[macro_use]
mod common;

use cancel_lines::{
    CancelHandle, CancelKind, Cx, Done, Either, Error, Sleep, cancellable, select, sleep,
};
use common::ms;
use futures_lite::future;
use std::time::Instant;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn e2e_public_types_cross_threads() {
    init_test!("e2e_public_types_cross_threads");
    assert_send_sync::<Cx>();
    assert_send_sync::<CancelHandle>();
    assert_send_sync::<Sleep>();
    assert_send_sync::<Done>();
    cancel_lines::test_complete!("e2e_public_types_cross_threads");
}

#[test]
fn e2e_second_cancel_changes_nothing() {
    init_test!("e2e_second_cancel_changes_nothing");
    let (cx, handle) = Cx::with_timeout(&Cx::background(), ms(5_000));
    assert!(handle.cancel());
    assert!(!handle.cancel());
    let reason = cx.reason().unwrap();
    assert_eq!(reason.kind(), CancelKind::User);
    assert!(matches!(cx.err(), Some(Error::Cancelled)));
    cancel_lines::test_complete!("e2e_second_cancel_changes_nothing");
}

#[test]
fn e2e_deadline_propagates_through_children() {
    init_test!("e2e_deadline_propagates_through_children");
    let (parent, _parent_handle) = Cx::with_timeout(&Cx::background(), ms(20));
    let (child, _child_handle) = Cx::with_cancel(&parent);
    let (grandchild, _grandchild_handle) = Cx::with_timeout(&child, ms(5_000));

    assert_eq!(grandchild.deadline(), parent.deadline());
    let reason = grandchild.wait_timeout(ms(2_000)).expect("deadline fired");
    assert!(reason.is_deadline());
    assert_eq!(
        child.err().map(|e| e.to_string()).as_deref(),
        Some("context deadline exceeded")
    );
    cancel_lines::test_complete!("e2e_deadline_propagates_through_children");
}

#[test]
fn e2e_past_deadline_is_already_done() {
    init_test!("e2e_past_deadline_is_already_done");
    let (cx, _handle) = Cx::with_deadline(&Cx::background(), Instant::now());
    assert!(cx.is_cancelled());
    let reason = future::block_on(cx.done());
    assert!(reason.is_deadline());
    cancel_lines::test_complete!("e2e_past_deadline_is_already_done");
}

#[test]
fn e2e_select_reports_the_earlier_timer() {
    init_test!("e2e_select_reports_the_earlier_timer");
    let (cx, _handle) = Cx::with_timeout(&Cx::background(), ms(2_000));
    let started = Instant::now();
    let winner = future::block_on(select(sleep(ms(10)), cx.done()));
    assert!(matches!(winner, Either::Left(())));
    assert!(started.elapsed() >= ms(10));
    assert!(!cx.is_cancelled());
    cancel_lines::test_complete!("e2e_select_reports_the_earlier_timer");
}

#[test]
fn e2e_cancellable_stops_at_deadline() {
    init_test!("e2e_cancellable_stops_at_deadline");
    let (cx, _handle) = Cx::with_timeout(&Cx::background(), ms(15));
    let started = Instant::now();
    let result = future::block_on(cancellable(&cx, sleep(ms(5_000))));
    assert!(matches!(result, Err(Error::DeadlineExceeded)));
    assert!(started.elapsed() < ms(2_000));
    cancel_lines::test_complete!("e2e_cancellable_stops_at_deadline");
}
