//! Cancellable file line reader.

use super::lines::{DEFAULT_MAX_LINE_LEN, Lines, ScanError};
use crate::cx::Cx;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Reads a file line by line into a sink, unless its context was cancelled
/// before the file was opened.
///
/// # Example
///
/// ```no_run
/// use cancel_lines::{Cx, LineReader};
///
/// let cx = Cx::background();
/// let mut out = Vec::new();
/// let printed = LineReader::new("test.ini").skip(1).read_to(&cx, &mut out)?;
/// # Ok::<(), cancel_lines::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LineReader {
    path: PathBuf,
    skip: usize,
    max_line_len: usize,
}

impl LineReader {
    /// Creates a reader for `path` that prints every line.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip: 0,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// Discards the first `lines` lines before printing.
    #[must_use]
    pub const fn skip(mut self, lines: usize) -> Self {
        self.skip = lines;
        self
    }

    /// Sets the maximum accepted line length in bytes.
    #[must_use]
    pub const fn max_line_len(mut self, bytes: usize) -> Self {
        self.max_line_len = bytes;
        self
    }

    /// Returns the path this reader opens.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks `cx`, opens the file and writes each line after the skipped
    /// prefix to `sink`, newline-terminated.
    ///
    /// Cancellation is only observed before the file is opened: once the
    /// read has started it runs to the end of the file. Returns the number
    /// of lines written.
    pub fn read_to<W: Write + ?Sized>(&self, cx: &Cx, sink: &mut W) -> Result<usize> {
        if let Err(err) = cx.check() {
            tracing::debug!(path = %self.path.display(), %err, "context done before open");
            return Err(err);
        }

        let file = File::open(&self.path).map_err(|source| Error::Open {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), skip = self.skip, "reading lines");

        let mut printed = 0;
        let lines = Lines::with_max_len(BufReader::new(file), self.max_line_len);
        for (index, line) in lines.enumerate() {
            let line = line.map_err(|err| self.scan_error(err))?;
            if index < self.skip {
                continue;
            }
            writeln!(sink, "{line}").map_err(Error::Write)?;
            printed += 1;
        }
        sink.flush().map_err(Error::Write)?;

        tracing::debug!(path = %self.path.display(), printed, "finished reading");
        Ok(printed)
    }

    fn scan_error(&self, err: ScanError) -> Error {
        match err {
            ScanError::Io(source) => Error::Read {
                path: self.path.clone(),
                source,
            },
            ScanError::TooLong { limit } => Error::LineTooLong {
                path: self.path.clone(),
                limit,
            },
        }
    }
}

/// Reads `path` into `sink`, skipping the first `skip` lines.
///
/// Shorthand for `LineReader::new(path).skip(skip).read_to(cx, sink)`.
pub fn read_lines<W: Write + ?Sized>(
    cx: &Cx,
    path: impl AsRef<Path>,
    skip: usize,
    sink: &mut W,
) -> Result<usize> {
    LineReader::new(path.as_ref()).skip(skip).read_to(cx, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn prints_every_line_by_default() {
        init_test("prints_every_line_by_default");
        let file = fixture("A\nB\nC\n");
        let mut out = Vec::new();
        let printed = LineReader::new(file.path())
            .read_to(&Cx::background(), &mut out)
            .unwrap();
        assert_eq!(printed, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "A\nB\nC\n");
        crate::test_complete!("prints_every_line_by_default");
    }

    #[test]
    fn skip_one_drops_exactly_the_first_line() {
        init_test("skip_one_drops_exactly_the_first_line");
        let file = fixture("A\nB\nC\n");
        let mut out = Vec::new();
        let printed = read_lines(&Cx::background(), file.path(), 1, &mut out).unwrap();
        crate::assert_with_log!(printed == 2, "two lines printed", 2, printed);
        assert_eq!(String::from_utf8(out).unwrap(), "B\nC\n");
        crate::test_complete!("skip_one_drops_exactly_the_first_line");
    }

    #[test]
    fn skip_past_end_prints_nothing() {
        init_test("skip_past_end_prints_nothing");
        let file = fixture("only\n");
        let mut out = Vec::new();
        let printed = read_lines(&Cx::background(), file.path(), 5, &mut out).unwrap();
        assert_eq!(printed, 0);
        assert!(out.is_empty());
        crate::test_complete!("skip_past_end_prints_nothing");
    }

    #[test]
    fn cancelled_context_returns_before_open() {
        init_test("cancelled_context_returns_before_open");
        let (cx, handle) = Cx::with_cancel(&Cx::background());
        handle.cancel();
        let mut out = Vec::new();
        // The path does not exist: an open attempt would fail differently.
        let result = read_lines(&cx, "/definitely/not/here.ini", 1, &mut out);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(out.is_empty());
        crate::test_complete!("cancelled_context_returns_before_open");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        init_test("missing_file_is_an_open_error");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ini");
        let mut out = Vec::new();
        let err = read_lines(&Cx::background(), &path, 1, &mut out).unwrap_err();
        match &err {
            Error::Open { path: failed, .. } => assert_eq!(failed, &path),
            other => panic!("expected open error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("open "));
        assert!(out.is_empty(), "nothing is scanned after a failed open");
        crate::test_complete!("missing_file_is_an_open_error");
    }

    #[test]
    fn overlong_line_reports_path() {
        init_test("overlong_line_reports_path");
        let file = fixture("short\nthis line is far too long\n");
        let mut out = Vec::new();
        let err = LineReader::new(file.path())
            .max_line_len(8)
            .read_to(&Cx::background(), &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::LineTooLong { limit: 8, .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "short\n");
        crate::test_complete!("overlong_line_reports_path");
    }
}
