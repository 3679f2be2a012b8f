//! Per-connection framing of pipelined requests.

use super::{Request, Response};
use crate::error::ConnectionError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const HEADER_END: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 1024;

/// One client's byte stream plus the bytes read but not yet consumed.
///
/// A single read may carry several pipelined requests; whatever follows the first
/// complete head stays buffered, untouched and in order, for the next call.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    buffer: Vec<u8>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub const fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
        }
    }

    /// Read until a complete request head is buffered, then parse it.
    ///
    /// Returns without touching the stream when a complete head is already buffered.
    pub async fn next_request(&mut self) -> Result<Request, ConnectionError> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut scanned = 0;
        loop {
            if let Some(end) = find_header_end(&self.buffer, scanned) {
                let head: Vec<u8> = self.buffer.drain(..end + HEADER_END.len()).collect();
                return Ok(Request::parse(&String::from_utf8_lossy(&head)));
            }
            // A terminator may straddle the old and new bytes.
            scanned = self.buffer.len().saturating_sub(HEADER_END.len() - 1);

            let read = self.stream.read(&mut chunk).await?;
            if read == 0 {
                return Err(ConnectionError::Closed);
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    /// Write the whole response. Any failure ends the connection.
    pub async fn write_response(&mut self, response: &Response) -> Result<(), ConnectionError> {
        self.stream.write_all(&response.to_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Bytes received after the last extracted request head.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Offset of the first `\r\n\r\n` at or after `from`.
fn find_header_end(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(HEADER_END.len())
        .position(|window| window == HEADER_END)
        .map(|offset| from + offset)
}
