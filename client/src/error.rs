use shared::ProtocolError;
use std::io;

/// Everything that can stop one of the client's loops.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A socket failed or was closed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The server sent bytes that do not follow the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[source] ProtocolError),

    /// The first server message was not a Hello.
    #[error("expected Hello as the first server message, got {0}")]
    MissingHello(&'static str),

    /// A Hello arrived after the session had already been set up.
    #[error("unexpected Hello in the middle of a session")]
    UnexpectedHello,

    /// A configured address could not be parsed or resolved.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A configured value the protocol cannot carry.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Stream failures and closes seen while decoding are transport errors;
/// everything else is a protocol violation.
impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => ClientError::Transport(e),
            ProtocolError::ConnectionClosed => ClientError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            )),
            other => ClientError::Protocol(other),
        }
    }
}
