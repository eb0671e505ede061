//! RTP-like framing for the voice media socket. The transport is TCP,
//! so every datagram is prefixed on the wire with a 32-bit big-endian
//! length; this module handles the RTP header and payload that follow it.

use crate::error::ProtocolError;

/// Fixed 12-byte header: version/padding/extension/csrc_count byte,
/// marker/payload_type byte, sequence, timestamp, SSRC.
pub const RTP_HEADER_LEN: usize = 12;

/// Voice payload type used for outbound packets and required on inbound ones.
pub const PAYLOAD_TYPE_VOICE: u8 = 3;

/// Four 33-byte GSM frames plus a 4-byte UID trailer.
pub const VOICE_PAYLOAD_LEN: usize = 4 * 33 + 4;

pub const RTP_VERSION: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub payload: Vec<u8>,
}

impl RtpPacket {
    /// Build an outbound voice packet: payload_type 3, no padding/extension,
    /// no CSRCs, payload = four GSM frames + 4-byte UID trailer. The header's
    /// first word is always `0x8003` on the wire, so the marker bit is
    /// always clear.
    pub fn voice(sequence: u16, timestamp: u32, local_uid: u32, gsm_frames: &[[u8; 33]; 4]) -> Self {
        let mut payload = Vec::with_capacity(VOICE_PAYLOAD_LEN);
        for frame in gsm_frames {
            payload.extend_from_slice(frame);
        }
        payload.extend_from_slice(&local_uid.to_be_bytes());
        Self {
            version: RTP_VERSION,
            padding: false,
            extension: false,
            marker: false,
            payload_type: PAYLOAD_TYPE_VOICE,
            sequence,
            timestamp,
            ssrc: local_uid,
            csrc: Vec::new(),
            payload,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RTP_HEADER_LEN + self.csrc.len() * 4 + self.payload.len());

        let byte0 = (self.version & 0b11) << 6
            | (self.padding as u8) << 5
            | (self.extension as u8) << 4
            | (self.csrc.len() as u8 & 0x0F);
        let byte1 = (self.marker as u8) << 7 | (self.payload_type & 0x7F);

        out.push(byte0);
        out.push(byte1);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        for csrc in &self.csrc {
            out.extend_from_slice(&csrc.to_be_bytes());
        }
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < RTP_HEADER_LEN {
            return Err(ProtocolError::PacketTooShort { expected: RTP_HEADER_LEN, got: buf.len() });
        }

        let byte0 = buf[0];
        let byte1 = buf[1];
        let version = (byte0 >> 6) & 0b11;
        let padding = (byte0 >> 5) & 1 == 1;
        let extension = (byte0 >> 4) & 1 == 1;
        let csrc_count = (byte0 & 0x0F) as usize;
        let marker = (byte1 >> 7) & 1 == 1;
        let payload_type = byte1 & 0x7F;
        let sequence = u16::from_be_bytes([buf[2], buf[3]]);
        let timestamp = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);

        let csrc_end = RTP_HEADER_LEN + csrc_count * 4;
        if buf.len() < csrc_end {
            return Err(ProtocolError::PacketTooShort { expected: csrc_end, got: buf.len() });
        }
        let mut csrc = Vec::with_capacity(csrc_count);
        for i in 0..csrc_count {
            let off = RTP_HEADER_LEN + i * 4;
            csrc.push(u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]));
        }

        let payload = buf[csrc_end..].to_vec();

        Ok(Self { version, padding, extension, marker, payload_type, sequence, timestamp, ssrc, csrc, payload })
    }

    /// Prepends the 4-byte big-endian length prefix the media socket uses
    /// on top of the RTP datagram (the channel is TCP, not UDP).
    pub fn to_framed_bytes(&self) -> Vec<u8> {
        let body = self.to_bytes();
        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// True when this inbound packet should be accepted for playback:
    /// payload_type must be 3 and payload length at least 136 bytes.
    pub fn is_valid_voice_packet(&self) -> bool {
        self.payload_type == PAYLOAD_TYPE_VOICE && self.payload.len() >= VOICE_PAYLOAD_LEN
    }

    /// Splits a valid voice payload into its four 33-byte GSM frames,
    /// ignoring the trailing 4-byte UID.
    pub fn gsm_frames(&self) -> Result<[[u8; 33]; 4], ProtocolError> {
        if self.payload.len() < VOICE_PAYLOAD_LEN {
            return Err(ProtocolError::PacketTooShort { expected: VOICE_PAYLOAD_LEN, got: self.payload.len() });
        }
        let mut frames = [[0u8; 33]; 4];
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.copy_from_slice(&self.payload[i * 33..i * 33 + 33]);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario 4: seq=1234, ts=5_000_000, ssrc=777, four 33-byte GSM
    /// frames of 0xAA, trailer = 777 BE32. Serialize -> parse -> fields
    /// equal; payload length 136.
    #[test]
    fn rtp_round_trip_scenario() {
        let frames = [[0xAAu8; 33]; 4];
        let packet = RtpPacket::voice(1234, 5_000_000, 777, &frames);
        assert_eq!(packet.payload.len(), VOICE_PAYLOAD_LEN);
        assert_eq!(packet.payload.len(), 136);

        let bytes = packet.to_bytes();
        let parsed = RtpPacket::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.sequence, 1234);
        assert_eq!(parsed.timestamp, 5_000_000);
        assert_eq!(parsed.ssrc, 777);
        assert_eq!(parsed.payload_type, PAYLOAD_TYPE_VOICE);
        assert_eq!(parsed.payload.len(), 136);
        assert_eq!(parsed, packet);

        let trailer = &parsed.payload[132..136];
        assert_eq!(u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]), 777);
    }

    #[test]
    fn framed_bytes_prepend_length() {
        let frames = [[0u8; 33]; 4];
        let packet = RtpPacket::voice(1, 2, 3, &frames);
        let framed = packet.to_framed_bytes();
        let len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
        assert_eq!(len, framed.len() - 4);
    }

    #[test]
    fn invalid_payload_type_is_rejected() {
        let mut packet = RtpPacket::voice(1, 2, 3, &[[0u8; 33]; 4]);
        packet.payload_type = 9;
        assert!(!packet.is_valid_voice_packet());
    }

    #[test]
    fn short_payload_is_rejected() {
        let mut packet = RtpPacket::voice(1, 2, 3, &[[0u8; 33]; 4]);
        packet.payload.truncate(100);
        assert!(!packet.is_valid_voice_packet());
    }

    #[test]
    fn csrc_list_round_trips() {
        let packet = RtpPacket {
            version: 2,
            padding: false,
            extension: false,
            marker: false,
            payload_type: 3,
            sequence: 9,
            timestamp: 100,
            ssrc: 55,
            csrc: vec![1, 2, 3],
            payload: vec![0xFF; VOICE_PAYLOAD_LEN],
        };
        let bytes = packet.to_bytes();
        let parsed = RtpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.csrc, vec![1, 2, 3]);
        assert_eq!(parsed.payload, packet.payload);
    }

    #[test]
    fn header_too_short_is_rejected() {
        let err = RtpPacket::from_bytes(&[0, 1, 2]).unwrap_err();
        assert!(matches!(err, ProtocolError::PacketTooShort { .. }));
    }

    #[test]
    fn gsm_frames_split_correctly() {
        let mut frames_in = [[0u8; 33]; 4];
        for (i, frame) in frames_in.iter_mut().enumerate() {
            frame.fill(i as u8);
        }
        let packet = RtpPacket::voice(1, 2, 3, &frames_in);
        let frames_out = packet.gsm_frames().unwrap();
        assert_eq!(frames_out, frames_in);
    }
}
