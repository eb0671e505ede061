use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame too short: expected at least {expected} bytes, got {got}")]
    PacketTooShort { expected: usize, got: usize },

    #[error("unknown opcode: {0}")]
    UnknownOpcode(i16),

    #[error("frame body too large: {0} bytes (max {max})", max = u16::MAX)]
    MessageTooLarge(usize),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_too_short_display() {
        let e = ProtocolError::PacketTooShort { expected: 6, got: 2 };
        let msg = e.to_string();
        assert!(msg.contains('6'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn unknown_opcode_display() {
        let e = ProtocolError::UnknownOpcode(-69);
        assert!(e.to_string().contains("-69"));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken");
        let proto_err: ProtocolError = io_err.into();
        assert!(proto_err.to_string().contains("broken"));
    }
}
