//! Line scanner over buffered readers.

use std::io::{self, BufRead};

/// Default maximum line length in bytes (64 KiB).
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Error produced while scanning lines.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A line was longer than the configured limit.
    #[error("line exceeds {limit} bytes")]
    TooLong {
        /// The configured limit in bytes.
        limit: usize,
    },
}

/// Iterator over the lines of a [`BufRead`].
///
/// Lines are split on `\n`; one trailing `\r` is stripped. A final line
/// without a terminator is still yielded, but a trailing newline does not
/// produce an empty last line. Bytes that are not valid UTF-8 are replaced
/// with `U+FFFD`.
///
/// The iterator stops after the first error.
#[derive(Debug)]
pub struct Lines<R> {
    reader: R,
    buf: Vec<u8>,
    max_len: usize,
    done: bool,
}

impl<R: BufRead> Lines<R> {
    /// Creates a scanner with the default line limit.
    pub fn new(reader: R) -> Self {
        Self::with_max_len(reader, DEFAULT_MAX_LINE_LEN)
    }

    /// Creates a scanner that rejects lines longer than `max_len` bytes
    /// (terminator excluded).
    pub fn with_max_len(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_len,
            done: false,
        }
    }

    fn take_line(&mut self) -> String {
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }

    fn scan(&mut self) -> Result<Option<String>, ScanError> {
        loop {
            let (consumed, terminated) = {
                let available = match self.reader.fill_buf() {
                    Ok(available) => available,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err.into()),
                };
                if available.is_empty() {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(self.take_line()));
                }

                let newline = available.iter().position(|&b| b == b'\n');
                let content = newline.unwrap_or(available.len());
                if self.buf.len() + content > self.max_len {
                    return Err(ScanError::TooLong {
                        limit: self.max_len,
                    });
                }
                self.buf.extend_from_slice(&available[..content]);
                (newline.map_or(content, |i| i + 1), newline.is_some())
            };
            self.reader.consume(consumed);

            if terminated {
                return Ok(Some(self.take_line()));
            }
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<String, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scan() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
