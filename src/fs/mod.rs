//! Line-oriented file reading.
//!
//! - [`Lines`]: scanner over any [`BufRead`](std::io::BufRead)
//! - [`LineReader`]: opens a file, honours a cancellation context, writes
//!   lines to a sink

pub mod lines;
pub mod reader;

pub use lines::{DEFAULT_MAX_LINE_LEN, Lines, ScanError};
pub use reader::{LineReader, read_lines};
