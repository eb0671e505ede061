//! The fixed 6-byte control-frame header, big-endian integer helpers, and
//! incremental buffered decode resisting short reads.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::opcodes::PROTOCOL_VERSION;

pub const HEADER_LEN: usize = 6;

/// One control-socket frame: `opcode:i16be, version:u16be, body_length:u16be`
/// followed by `body_length` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: i16,
    pub version: u16,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(opcode: i16, body: Vec<u8>) -> Self {
        Self { opcode, version: PROTOCOL_VERSION, body }
    }

    /// Serialize to exactly `6 + body.len()` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.body.len() > u16::MAX as usize {
            return Err(ProtocolError::MessageTooLarge(self.body.len()));
        }
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.extend_from_slice(&self.opcode.to_be_bytes());
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&(self.body.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.body);
        Ok(out)
    }

    /// Parse one complete frame from an exact-length buffer.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_LEN {
            return Err(ProtocolError::PacketTooShort { expected: HEADER_LEN, got: buf.len() });
        }
        let opcode = i16::from_be_bytes([buf[0], buf[1]]);
        let version = u16::from_be_bytes([buf[2], buf[3]]);
        let body_length = u16::from_be_bytes([buf[4], buf[5]]) as usize;
        if buf.len() < HEADER_LEN + body_length {
            return Err(ProtocolError::PacketTooShort {
                expected: HEADER_LEN + body_length,
                got: buf.len(),
            });
        }
        Ok(Self { opcode, version, body: buf[HEADER_LEN..HEADER_LEN + body_length].to_vec() })
    }
}

/// Attempt to extract one complete frame from a byte buffer, resisting
/// short reads. Returns `Ok(None)` when more data is needed, advancing the
/// buffer past the consumed frame on success.
pub fn try_decode_frame(buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    let opcode = i16::from_be_bytes([buf[0], buf[1]]);
    let version = u16::from_be_bytes([buf[2], buf[3]]);
    let body_length = u16::from_be_bytes([buf[4], buf[5]]) as usize;

    if buf.len() < HEADER_LEN + body_length {
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    let body = buf.split_to(body_length).to_vec();
    Ok(Some(Frame { opcode, version, body }))
}

/// Big-endian field helpers for hand-assembling frame bodies, mirroring the
/// wire layout the server expects (no implicit struct serialization).
pub struct BodyWriter {
    buf: Vec<u8>,
}

impl BodyWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// A 16-bit length-prefixed opaque string.
    pub fn prefixed_string(mut self, value: &str) -> Self {
        self.buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for BodyWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads big-endian integers at explicit offsets out of a frame body,
/// mirroring `PACKET_GET_LONG`/`PACKET_GET_SHORT`.
pub struct BodyReader<'a> {
    body: &'a [u8],
}

impl<'a> BodyReader<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self { body }
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, ProtocolError> {
        self.body
            .get(offset..offset + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or(ProtocolError::PacketTooShort { expected: offset + 2, got: self.body.len() })
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, ProtocolError> {
        self.body
            .get(offset..offset + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or(ProtocolError::PacketTooShort { expected: offset + 4, got: self.body.len() })
    }

    pub fn rest(&self, offset: usize) -> &'a [u8] {
        self.body.get(offset..).unwrap_or(&[])
    }

    /// Opaque bytes salvaged to valid UTF-8 at the display boundary, never assumed valid upstream.
    pub fn rest_lossy(&self, offset: usize) -> String {
        String::from_utf8_lossy(self.rest(offset)).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let frame = Frame::new(-20, vec![1, 2, 3]);
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 3);
        let parsed = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, frame);
    }

    /// Scenario 2: `FF EC 00 53 00 04 00 00 00 1E` parses to
    /// `{opcode=-20 (IM_OUT), version=0x0053, body_length=4, body=00 00 00 1E}`.
    #[test]
    fn frame_parse_scenario() {
        let bytes = [0xFF, 0xEC, 0x00, 0x53, 0x00, 0x04, 0x00, 0x00, 0x00, 0x1E];
        let frame = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.opcode, -20);
        assert_eq!(frame.version, 0x0053);
        assert_eq!(frame.body, vec![0x00, 0x00, 0x00, 0x1E]);
    }

    #[test]
    fn incremental_decode_resists_short_reads() {
        let frame = Frame::new(5, vec![9, 9, 9, 9]);
        let full = frame.to_bytes().unwrap();
        let mut buf = BytesMut::from(&full[..3]);
        assert!(try_decode_frame(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&full[3..]);
        let decoded = try_decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn too_short_header_is_rejected() {
        let err = Frame::from_bytes(&[0, 1, 0, 0x53]).unwrap_err();
        assert!(matches!(err, ProtocolError::PacketTooShort { .. }));
    }

    #[test]
    fn body_writer_matches_manual_layout() {
        let body = BodyWriter::new().u16(0x000A).u32(42).bytes(b"\x00\x00\x00\x00\x08\x2A").finish();
        assert_eq!(body, vec![0x00, 0x0A, 0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x08, 0x2A]);
    }

    #[test]
    fn body_reader_reads_offsets() {
        let body = vec![0, 0, 0, 42, 0, 7];
        let reader = BodyReader::new(&body);
        assert_eq!(reader.u32_at(0).unwrap(), 42);
        assert_eq!(reader.u16_at(4).unwrap(), 7);
        assert!(reader.u32_at(10).is_err());
    }
}
