use thiserror::Error;

/// Error taxonomy from the session's perspective. `Transport` failures on
/// the control socket terminate the session; `Protocol`/`Media` errors are
/// logged and the offending frame/packet dropped; `Room` preconditions are
/// reported as per-room system messages; `Transfer` errors cancel only the
/// affected transfer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] pt_protocol::ProtocolError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("room error: {0}")]
    Room(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("transfer error: {0}")]
    Transfer(String),

    #[error("bootstrap fetch failed: {0}")]
    Bootstrap(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_converts() {
        let proto_err = pt_protocol::ProtocolError::UnknownOpcode(9);
        let err: Error = proto_err.into();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn room_error_message_is_preserved() {
        let err = Error::Room("not admin".to_string());
        assert_eq!(err.to_string(), "room error: not admin");
    }
}
