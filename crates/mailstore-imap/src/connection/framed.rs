//! Response framing.
//!
//! One server response is a line that may end in a literal announcement
//! (`{n}`, `{n+}` or `~{n}`); the announced bytes follow, then the line
//! continues. [`FramedStream::read_response`] hands the parser the whole
//! thing, literals spliced in, terminated by the final CRLF.

#![allow(clippy::missing_errors_doc)]

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_CAPACITY: usize = 16 * 1024;

/// Longest line segment accepted between literals.
const LINE_LIMIT: usize = 1024 * 1024;

/// Largest literal accepted.
const LITERAL_LIMIT: usize = 64 * 1024 * 1024;

/// Buffered transport that reads whole responses and writes whole commands.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    frame: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_CAPACITY, stream),
            frame: BytesMut::with_capacity(READ_CAPACITY),
        }
    }

    /// Reads one response, literals included.
    ///
    /// End of stream, an oversized line or an oversized literal is
    /// [`Error::ConnectionBroken`]: the unread bytes leave the stream out of
    /// step with the command flow.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        self.frame.clear();
        loop {
            let start = self.frame.len();
            self.read_segment().await?;
            let Some(size) = literal_size(&self.frame[start..]) else {
                break;
            };
            if size > LITERAL_LIMIT {
                return Err(Error::ConnectionBroken(format!(
                    "literal of {size} bytes exceeds the {LITERAL_LIMIT} byte limit"
                )));
            }
            let at = self.frame.len();
            self.frame.resize(at + size, 0);
            self.reader.read_exact(&mut self.frame[at..]).await?;
        }
        Ok(self.frame.to_vec())
    }

    /// Appends bytes up to and including the next LF to the frame.
    async fn read_segment(&mut self) -> Result<()> {
        let mut taken = 0;
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(Error::ConnectionBroken("server closed the connection".to_string()));
            }

            let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => (&available[..=end], true),
                None => (available, false),
            };
            let len = chunk.len();
            self.frame.extend_from_slice(chunk);
            self.reader.consume(len);
            taken += len;

            if done {
                return Ok(());
            }
            if taken > LINE_LIMIT {
                return Err(Error::ConnectionBroken(format!(
                    "response line exceeds the {LINE_LIMIT} byte limit"
                )));
            }
        }
    }

    /// Writes `data` and flushes.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Closes the write half, ignoring errors.
    pub async fn shutdown(&mut self) {
        let _ = self.reader.get_mut().shutdown().await;
    }
}

/// Size announced by a literal at the end of `segment`, if any.
fn literal_size(segment: &[u8]) -> Option<usize> {
    let body = segment
        .strip_suffix(b"\r\n")
        .or_else(|| segment.strip_suffix(b"\n"))?;
    let body = body.strip_suffix(b"}")?;
    let open = body.iter().rposition(|&b| b == b'{')?;
    let digits = &body[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
