use std::io::{self, BufRead};

/// A line-oriented reader that keeps track of where it is in the stream.
///
/// Lines that are read are stored in an internal buffer that is reused between calls, so reading
/// does not allocate once the buffer has grown to the longest line. Lines that are skipped are
/// never copied out of the underlying [`BufRead`] at all.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    line: String,
    /// Number of lines consumed so far.
    lineno: u64,
    /// Number of bytes consumed so far.
    offset: u64,
    /// Byte offset at which the most recently consumed line starts.
    start: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
            lineno: 0,
            offset: 0,
            start: 0,
        }
    }

    /// Reads the next line into the internal buffer. It is available through
    /// [`LineReader::current`] afterwards.
    ///
    /// Returns `false` at the end of the stream.
    pub fn read_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        let n = self.inner.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(false);
        }
        self.advance(n);
        Ok(true)
    }

    /// Consumes the next line without looking at its contents.
    ///
    /// Returns `false` if the stream was already at its end.
    pub fn skip_line(&mut self) -> io::Result<bool> {
        let mut n = 0;
        loop {
            let buf = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if buf.is_empty() {
                break;
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(idx) => {
                    self.inner.consume(idx + 1);
                    n += idx + 1;
                    break;
                }
                None => {
                    let len = buf.len();
                    self.inner.consume(len);
                    n += len;
                }
            }
        }
        if n == 0 {
            return Ok(false);
        }
        self.advance(n);
        Ok(true)
    }

    /// Skips `count` lines. Returns the number of lines that were actually skipped, which is
    /// smaller than `count` only if the stream ended.
    pub fn skip_lines(&mut self, count: u64) -> io::Result<u64> {
        for skipped in 0..count {
            if !self.skip_line()? {
                return Ok(skipped);
            }
        }
        Ok(count)
    }

    /// The most recently read line, without its line ending.
    ///
    /// Skipping a line does not touch this buffer.
    pub fn current(&self) -> &str {
        self.line.trim_end_matches(['\n', '\r'])
    }

    /// 1-based number of the most recently consumed line, or zero if nothing was consumed yet.
    pub fn lineno(&self) -> u64 {
        self.lineno
    }

    /// Byte offset at which the most recently consumed line starts.
    pub fn line_offset(&self) -> u64 {
        self.start
    }

    /// Total number of bytes consumed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn advance(&mut self, nbytes: usize) {
        self.start = self.offset;
        self.offset += nbytes as u64;
        self.lineno += 1;
    }
}

/// Returns the first whitespace-delimited field of a line.
pub(crate) fn first_field(line: &str) -> Option<&str> {
    line.split_ascii_whitespace().next()
}
