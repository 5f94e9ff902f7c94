//! Error types for the wire protocol.

/// Errors raised while reading, decoding or encoding protocol messages.
///
/// Every variant except [`ProtocolError::Io`] and
/// [`ProtocolError::ConnectionClosed`] means the peers disagree about the
/// byte layout, so a TCP session that sees one cannot be resynchronised.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The peer closed the stream while a value was still being read.
    #[error("connection closed")]
    ConnectionClosed,

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message discriminator outside the range defined for its channel.
    #[error("unknown {kind} message type {value}")]
    UnknownMessage {
        /// Which message family was being decoded.
        kind: &'static str,
        /// The offending discriminator byte.
        value: u8,
    },

    /// An event discriminator inside a Turn outside `0..=3`.
    #[error("unknown event type {0}")]
    UnknownEvent(u8),

    /// A Move carrying a direction outside `0..=3`.
    #[error("invalid direction {0}")]
    InvalidDirection(u8),

    /// A datagram whose length does not match its fixed layout.
    #[error("{kind} message must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Which message was being decoded.
        kind: &'static str,
        /// Length required by the layout.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },

    /// A zero-length datagram.
    #[error("empty datagram")]
    EmptyDatagram,

    /// A string field whose bytes are not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// A string longer than the 1-byte length prefix can describe.
    #[error("string of {0} bytes exceeds 255")]
    StringTooLong(usize),

    /// A collection longer than the 4-byte count prefix can describe.
    #[error("collection of {0} elements exceeds u32::MAX")]
    CollectionTooLarge(usize),
}
