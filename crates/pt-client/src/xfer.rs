//! File transfer sub-protocol. A small text handshake over its own
//! TCP connection, then a raw byte stream until `bytes_transferred ==
//! size`. Modeled as a pure state machine driven by line-at-a-time input
//! so the handshake can be exercised without a live socket.

use pt_protocol::frame::{BodyWriter, Frame};
use pt_protocol::opcodes;

use crate::error::{Error, Result};
use crate::session::TransferPhase;

/// Implicit "recipient chose not to receive" reject reason, used when
/// `FILE_XFER_RECV_INIT` falls through to a reject with no local handling
/// in progress.
pub const REJECT_REASON_DECLINED: u16 = 0x000A;

/// `FILE_XFER_SEND_INIT`'s body: `{uin: u32be, "C:\\<filename>"}`. The
/// Windows-style path prefix is part of the wire format, reproduced as-is.
pub fn build_send_init(uin: u32, filename: &str) -> Frame {
    let path = format!("C:\\{filename}");
    let body = BodyWriter::new().u32(uin).bytes(path.as_bytes()).finish();
    Frame::new(opcodes::FILE_XFER_SEND_INIT, body)
}

/// `FILE_XFER_REJECT`'s body: `{uin: u32be, transfer_id: u32be, reason: u16be}`.
pub fn build_reject(uin: u32, transfer_id: u32, reason: u16) -> Frame {
    let body = BodyWriter::new().u32(uin).u32(transfer_id).u16(reason).finish();
    Frame::new(opcodes::FILE_XFER_REJECT, body)
}

pub const CONNECT_BANNER: &str = "CONNECT\tOK\n";
pub const AUTH_OK: &str = "AUTH\tOK\n";

pub fn build_intro_line(local_uid: u32, transfer_id: u32) -> String {
    format!("INTRO\t{local_uid}\t{transfer_id}\n")
}

pub fn build_send_line(from_uid: u32, to_uid: u32, nickname: &str, size: u64, filename: &str) -> String {
    format!("SEND\t{from_uid}\t{to_uid}\t{nickname}\t{size}\t{filename}\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendLine {
    pub from_uid: u32,
    pub to_uid: u32,
    pub nickname: String,
    pub size: u64,
    pub filename: String,
}

pub fn parse_send_line(line: &str) -> Result<SendLine> {
    let trimmed = line.trim_end_matches('\n');
    let parts: Vec<&str> = trimmed.split('\t').collect();
    if parts.len() != 6 || parts[0] != "SEND" {
        return Err(Error::Transfer(format!("malformed SEND line: {line:?}")));
    }
    let from_uid = parts[1].parse().map_err(|_| Error::Transfer("bad from_uid".to_string()))?;
    let to_uid = parts[2].parse().map_err(|_| Error::Transfer("bad to_uid".to_string()))?;
    let nickname = parts[3].to_string();
    let size = parts[4].parse().map_err(|_| Error::Transfer("bad size".to_string()))?;
    let filename = parts[5].to_string();
    Ok(SendLine { from_uid, to_uid, nickname, size, filename })
}

/// Drives one transfer's handshake forward one step at a time. The caller
/// feeds each line read from the socket and checks the returned phase;
/// once `Sending` is reached, the caller switches the watcher off and
/// streams raw bytes until `transferred == size`.
#[derive(Debug)]
pub struct TransferHandshake {
    pub phase: TransferPhase,
    local_uid: u32,
    transfer_id: u32,
    pub send_line: Option<SendLine>,
}

impl TransferHandshake {
    pub fn new(local_uid: u32, transfer_id: u32) -> Self {
        Self { phase: TransferPhase::Requested, local_uid, transfer_id, send_line: None }
    }

    /// First step after connecting: expects the literal banner.
    pub fn on_connect_banner(&mut self, line: &str) -> Result<String> {
        if line != CONNECT_BANNER {
            return Err(Error::Transfer(format!("unexpected banner: {line:?}")));
        }
        self.phase = TransferPhase::Connected;
        Ok(build_intro_line(self.local_uid, self.transfer_id))
    }

    pub fn on_auth_line(&mut self, line: &str) -> Result<()> {
        if line != AUTH_OK {
            return Err(Error::Transfer(format!("unexpected auth response: {line:?}")));
        }
        self.phase = TransferPhase::Authenticated;
        Ok(())
    }

    pub fn on_send_line(&mut self, line: &str) -> Result<&SendLine> {
        let parsed = parse_send_line(line)?;
        self.phase = TransferPhase::Sending;
        self.send_line = Some(parsed);
        Ok(self.send_line.as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario 6: the full handshake for a 12-byte inbound file.
    #[test]
    fn file_receive_happy_path_handshake() {
        let mut handshake = TransferHandshake::new(5, 9);
        let intro = handshake.on_connect_banner(CONNECT_BANNER).unwrap();
        assert_eq!(intro, "INTRO\t5\t9\n");
        assert_eq!(handshake.phase, TransferPhase::Connected);

        handshake.on_auth_line(AUTH_OK).unwrap();
        assert_eq!(handshake.phase, TransferPhase::Authenticated);

        let send_line = build_send_line(5, 5, "peer", 12, "a.txt");
        let parsed = handshake.on_send_line(&send_line).unwrap();
        assert_eq!(parsed.from_uid, 5);
        assert_eq!(parsed.size, 12);
        assert_eq!(parsed.filename, "a.txt");
        assert_eq!(handshake.phase, TransferPhase::Sending);
    }

    #[test]
    fn rejects_wrong_banner() {
        let mut handshake = TransferHandshake::new(1, 2);
        assert!(handshake.on_connect_banner("GARBAGE\n").is_err());
    }

    #[test]
    fn rejects_malformed_send_line() {
        assert!(parse_send_line("SEND\tonly\ttwo\n").is_err());
    }

    #[test]
    fn send_init_embeds_windows_path_prefix() {
        let frame = build_send_init(7, "photo.jpg");
        assert_eq!(frame.opcode, opcodes::FILE_XFER_SEND_INIT);
        let path = String::from_utf8_lossy(&frame.body[4..]);
        assert_eq!(path, "C:\\photo.jpg");
    }

    #[test]
    fn reject_frame_carries_declined_reason() {
        let frame = build_reject(7, 9, REJECT_REASON_DECLINED);
        assert_eq!(frame.opcode, opcodes::FILE_XFER_REJECT);
        assert_eq!(&frame.body[8..10], &REJECT_REASON_DECLINED.to_be_bytes());
    }

    #[test]
    fn send_line_round_trips() {
        let line = build_send_line(1, 2, "nick", 100, "file.bin");
        let parsed = parse_send_line(&line).unwrap();
        assert_eq!(parsed, SendLine { from_uid: 1, to_uid: 2, nickname: "nick".into(), size: 100, filename: "file.bin".into() });
    }
}
