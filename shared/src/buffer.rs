//! Incremental reader that turns an unframed byte stream into typed fields.
//!
//! TCP delivers bytes, not messages: a single `read` may return half of a
//! `u32`, or the tail of one message followed by the head of the next. The
//! [`WireBuffer`] hides this from the codec. Each typed read is served from
//! bytes already received; when too few remain, the unconsumed tail is moved
//! to the front of the buffer and the stream is read again until the value is
//! complete.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ProtocolError;

/// Bytes requested from the stream per underlying read.
pub const TCP_BUFFER_LENGTH: usize = 2048;

/// Typed big-endian reader over an [`AsyncRead`] stream.
pub struct WireBuffer<R> {
    reader: R,
    data: Vec<u8>,
    /// Bytes of `data` already handed out to callers.
    parsed: usize,
    /// Bytes of `data` filled from the stream.
    available: usize,
}

impl<R: AsyncRead + Unpin> WireBuffer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            data: vec![0; TCP_BUFFER_LENGTH],
            parsed: 0,
            available: 0,
        }
    }

    /// Number of bytes consumed since the buffer was last refilled.
    pub fn bytes_parsed(&self) -> usize {
        self.parsed
    }

    /// Number of bytes held since the buffer was last refilled.
    pub fn bytes_available(&self) -> usize {
        self.available
    }

    /// True when every received byte has been consumed, i.e. the last value
    /// read ended exactly at the end of what the stream has delivered.
    pub fn is_drained(&self) -> bool {
        self.parsed == self.available
    }

    pub async fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        let [value] = self.take::<1>().await?;
        Ok(value)
    }

    pub async fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_be_bytes(self.take::<2>().await?))
    }

    pub async fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.take::<4>().await?))
    }

    /// Reads `len` bytes as a UTF-8 string. The bytes are consumed even
    /// when they are rejected.
    pub async fn read_string(&mut self, len: usize) -> Result<String, ProtocolError> {
        self.fill(len).await?;
        let bytes = self.data[self.parsed..self.parsed + len].to_vec();
        self.parsed += len;
        String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
    }

    async fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        self.fill(N).await?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.parsed..self.parsed + N]);
        self.parsed += N;
        Ok(out)
    }

    /// Ensures at least `needed` unconsumed bytes are buffered.
    async fn fill(&mut self, needed: usize) -> Result<(), ProtocolError> {
        while self.available - self.parsed < needed {
            // Keep the split value's leading bytes and start a fresh window.
            self.data.copy_within(self.parsed..self.available, 0);
            self.available -= self.parsed;
            self.parsed = 0;

            if self.data.len() < needed {
                self.data.resize(needed, 0);
            }

            let received = self.reader.read(&mut self.data[self.available..]).await?;
            if received == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            self.available += received;
        }
        Ok(())
    }
}
