//! The two demo programs as library functions.
//!
//! Both write program output to a caller-supplied sink. Diagnostics go
//! through `tracing`, never to the sink.

use crate::combinator::{Either, select};
use crate::config::DemoConfig;
use crate::cx::Cx;
use crate::error::{Error, Result};
use crate::fs::LineReader;
use crate::task;
use crate::time::sleep;
use futures_lite::future::block_on;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// How the deadline race ended.
#[derive(Debug)]
pub enum RaceReport {
    /// The delay won and this many lines were printed.
    Printed(usize),
    /// The delay won but the file could not be read. The error text was
    /// printed.
    ReadFailed(Error),
    /// The deadline won. `context deadline exceeded` was printed.
    DeadlineExceeded,
}

/// Races `config.delay` against a deadline of `config.deadline`.
///
/// If the delay elapses first, the file is printed minus its first
/// `config.skip_lines` lines. Otherwise the deadline error is printed. A
/// tie goes to the delay. The read itself is not bounded by the deadline.
///
/// Only failures to write to `sink` are returned as `Err`.
pub fn deadline_race<W: Write + ?Sized>(config: &DemoConfig, sink: &mut W) -> Result<RaceReport> {
    let (cx, _handle) = Cx::with_timeout(&Cx::background(), config.deadline);
    tracing::info!(
        delay_ms = config.delay.as_millis(),
        deadline_ms = config.deadline.as_millis(),
        "racing delay against deadline"
    );

    match block_on(select(sleep(config.delay), cx.done())) {
        Either::Left(()) => {
            tracing::info!(path = %config.path.display(), "delay elapsed first, reading file");
            let reader = LineReader::new(&config.path)
                .skip(config.skip_lines)
                .max_line_len(config.max_line_len);
            match reader.read_to(&Cx::background(), &mut *sink) {
                Ok(printed) => Ok(RaceReport::Printed(printed)),
                Err(Error::Write(source)) => Err(Error::Write(source)),
                Err(err) => {
                    writeln!(sink, "{err}").map_err(Error::Write)?;
                    Ok(RaceReport::ReadFailed(err))
                }
            }
        }
        Either::Right(reason) => {
            tracing::info!(%reason, "deadline fired first");
            writeln!(sink, "{}", reason.to_error()).map_err(Error::Write)?;
            Ok(RaceReport::DeadlineExceeded)
        }
    }
}

/// How the cancellable background read ended.
#[derive(Debug)]
pub struct CancelReport {
    /// Whether cancellation was fired.
    pub cancelled: bool,
    /// The reader task's result: lines printed, or why it stopped.
    pub outcome: Result<usize>,
}

/// Reads the file on a background task while the caller waits
/// `config.cancel_after` and then cancels if `should_cancel` says so.
///
/// The task checks for cancellation once, before opening the file, so
/// which of the two wins is a race. The task is joined before returning.
/// Its error, if any, is logged and recorded in the report; it never
/// reaches `sink`.
///
/// Returns `Err` if the task could not be spawned or panicked.
pub fn cancel_read<W, F>(
    config: &DemoConfig,
    sink: Arc<Mutex<W>>,
    should_cancel: F,
) -> Result<CancelReport>
where
    W: Write + Send + 'static,
    F: FnOnce() -> bool,
{
    let (cx, handle) = Cx::with_cancel(&Cx::background());
    let reader = LineReader::new(&config.path)
        .skip(config.skip_lines)
        .max_line_len(config.max_line_len);

    let task_cx = cx.clone();
    let task = task::spawn("reader", move || {
        let mut out = sink.lock();
        reader.read_to(&task_cx, &mut *out)
    })?;

    block_on(sleep(config.cancel_after));
    let cancelled = should_cancel();
    if cancelled {
        handle.cancel();
        tracing::info!("cancellation fired");
    }

    let outcome = task.join()?;
    match &outcome {
        Ok(printed) => tracing::info!(printed, "reader finished"),
        Err(err) => tracing::error!(error = %err, "reader failed"),
    }
    Ok(CancelReport { cancelled, outcome })
}
