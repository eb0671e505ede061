//! The protocol engine — handshake frame construction and the
//! opcode-to-handler dispatch table. Frame bodies are built by hand per
//! opcode, matching the wire layouts the server expects rather than
//! deriving them from a generic struct serializer.

use pt_protocol::frame::{BodyWriter, Frame};
use pt_protocol::obfuscate::{self, Variant};
use pt_protocol::opcodes;
use pt_protocol::phtml;
use pt_protocol::records::parse_records;

use crate::room;
use crate::roomlist::{parse_categories, parse_room_list};
use crate::search::parse_search_response;
use crate::session::{ConnectionState, Room, RoomState, Session};

/// `51873-335-9659427-09862`, the Internet Explorer product-id string the
/// client's `VERSIONS`/`UIN_FONTDEPTH_ETC` frames embed (cosmetic, but
/// load-bearing for server compatibility — reproduced verbatim).
const IE_PRODUCT_ID: &str = "51873-335-9659427-09862";
const WINDOWS_VERSION: &str = "5.0.2195.2.208";
const HD_SERIAL: u32 = 0x261308E2;

/// `GET_UIN`: requests the UID/nickname for a username with no cached UID.
pub fn build_get_uin(username: &str) -> Frame {
    let body = BodyWriter::new().bytes(&[0, 0, 0, 1]).bytes(username.as_bytes()).finish();
    Frame::new(opcodes::GET_UIN, body)
}

/// `LYMERICK`: identity string encoded with variant 0 over a fake hardware
/// serial, sent as the first step after the (re)connect handshake.
pub fn build_lymerick(session: &mut Session) -> Frame {
    let serial_hex = format!("{:08X}", HD_SERIAL);
    let (encoded, t) = obfuscate::encode(&serial_hex, Variant::V0, "", 0, 0, session.pseudo_time);
    session.pseudo_time = t;
    let body = BodyWriter::new().bytes(encoded.as_bytes()).finish();
    Frame::new(opcodes::LYMERICK, body)
}

/// `LOGIN`: obfuscated password (variant 1) and client IP (variant 2),
/// newline-separated, prefixed by the local UID.
pub fn build_login(session: &mut Session, password: &str, client_ip: &str) -> Frame {
    let server_key = session.server_key.clone().unwrap_or_default();
    let (enc_password, t1) = obfuscate::encode(password, Variant::V1, &server_key, 0, 0, session.pseudo_time);
    let (enc_ip, t2) = obfuscate::encode(client_ip, Variant::V2, &server_key, 0, 0, t1);
    session.pseudo_time = t2;

    let uid = session.local_uid.unwrap_or(0);
    let body = BodyWriter::new()
        .u32(uid)
        .bytes(enc_password.as_bytes())
        .bytes(b"\n")
        .bytes(enc_ip.as_bytes())
        .finish();
    Frame::new(opcodes::LOGIN, body)
}

/// `CHECKSUMS`: five fixed constants plus `"0"`, all variant-1 encoded,
/// newline-separated.
pub fn build_checksums(session: &mut Session) -> Frame {
    const CONSTANTS: [&str; 5] = ["90", "938749351", "1123530166", "-1040381015", "-878176803"];
    let server_key = session.server_key.clone().unwrap_or_default();
    let mut parts = Vec::with_capacity(6);
    let mut t = session.pseudo_time;
    for constant in CONSTANTS {
        let (encoded, next_t) = obfuscate::encode(constant, Variant::V1, &server_key, 0, 0, t);
        parts.push(encoded);
        t = next_t;
    }
    let (zero, next_t) = obfuscate::encode("0", Variant::V1, &server_key, 0, 0, t);
    parts.push(zero);
    session.pseudo_time = next_t;

    let body = BodyWriter::new().bytes(parts.join("\n").as_bytes()).finish();
    Frame::new(opcodes::CHECKSUMS, body)
}

/// `VERSIONS`: variant-3 encoded fields keyed off the session's "wierd".
pub fn build_versions(session: &mut Session, mac_address: &str) -> Frame {
    let (t, wierd) = obfuscate::wierd_number(session.pseudo_time);
    session.pseudo_time = t;
    session.wierd = wierd;

    let serial_hex = format!("{:08X}", HD_SERIAL);
    let mut t = session.pseudo_time;
    let mut encode_field = |value: &str| {
        let (encoded, next_t) = obfuscate::encode(value, Variant::V3, "", wierd, 0, t);
        t = next_t;
        encoded
    };
    let serial = encode_field(&serial_hex);
    let unknown = encode_field("????????");
    let version = encode_field(WINDOWS_VERSION);
    let mac = encode_field(mac_address);
    let neg_one = encode_field("-1");
    let product = encode_field(IE_PRODUCT_ID);
    session.pseudo_time = t;

    let fields = format!(
        "{},{},{},{},{},{},0,0,{},{}",
        wierd, serial, unknown, version, mac, neg_one, neg_one, product
    );
    let body = BodyWriter::new().bytes(&[0, 0, 0, 0, 0, 1]).u32(session.local_uid.unwrap_or(0)).bytes(fields.as_bytes()).finish();
    Frame::new(opcodes::VERSIONS, body)
}

/// `UIN_FONTDEPTH_ETC`: a 22-byte digit-permuted product-id blob.
pub fn build_uin_fontdepth(session: &Session) -> Frame {
    let mut blob = [0u8; 22];
    let t = session.pseudo_time as i64;
    blob[0] = ((t % 7) + 48) as u8;
    blob[1] = ((t % 3) + 48) as u8;

    let mut j: i64 = 2;
    for byte in IE_PRODUCT_ID.bytes() {
        if byte.is_ascii_digit() && (j as usize) < blob.len() {
            let shift = (((j - 2) % 5 - 47).rem_euclid(10)) as u8;
            blob[j as usize] = byte.wrapping_add(shift);
        }
        j += 1;
    }

    let body = BodyWriter::new()
        .bytes(&[0, 0, 0, 0, 0, 1])
        .u32(session.local_uid.unwrap_or(0))
        .bytes(&[0, 0, 0x04, 0x45])
        .bytes(&blob)
        .finish();
    Frame::new(opcodes::UIN_FONTDEPTH_ETC, body)
}

/// `VERSION_INFO`: a constant GUID-like string.
pub fn build_version_info() -> Frame {
    const GUID: &str = "{0A7FA8AB-9BC1-49b6-9C66-5AFFA4CD57AB}";
    let body = BodyWriter::new().bytes(GUID.as_bytes()).finish();
    Frame::new(opcodes::VERSION_INFO, body)
}

/// `IM_OUT`: body converted from HTML to pseudo-HTML.
pub fn build_im_out(target_uid: u32, html_body: &str) -> Frame {
    let pseudo = phtml::to_pseudo_html(html_body);
    let body = BodyWriter::new().u32(target_uid).bytes(pseudo.as_bytes()).finish();
    Frame::new(opcodes::IM_OUT, body)
}

/// `ROOM_JOIN(0, id)` for a plain room, or `ROOM_JOIN(1, id, password)`
/// for a room flagged locked in the room list.
pub fn build_room_join(room_id: u32, password: Option<&str>) -> Frame {
    let mut writer = BodyWriter::new();
    match password {
        Some(pw) => {
            writer = writer.bytes(&[0, 1]).u32(room_id).bytes(pw.as_bytes());
        }
        None => {
            writer = writer.bytes(&[0, 0]).u32(room_id);
        }
    }
    Frame::new(opcodes::ROOM_JOIN, writer.finish())
}

pub fn build_room_join_as_admin(owner_uid: u32, admin_code: &str) -> Frame {
    let body = BodyWriter::new().u32(owner_uid).bytes(admin_code.as_bytes()).finish();
    Frame::new(opcodes::ROOM_JOIN_AS_ADMIN, body)
}

/// Ban/bounce/reddot commands: `(room_id, target_uid)`, rejected locally
/// unless the room's admin flag is set.
pub fn build_admin_target_command(opcode: i16, session: &Session, room_id: u32, target_uid: u32) -> Option<Frame> {
    if !room::is_admin(session, room_id) {
        return None;
    }
    let body = BodyWriter::new().u32(room_id).u32(target_uid).finish();
    Some(Frame::new(opcode, body))
}

pub const TARGET_ALL: u32 = opcodes::TARGET_ALL;

/// `ROOM_BOUNCE_REASON`, a follow-up frame prefixed `"BR: "`.
pub fn build_bounce_reason(room_id: u32, reason: &str) -> Frame {
    let text = format!("BR: {reason}");
    let body = BodyWriter::new().u32(room_id).bytes(text.as_bytes()).finish();
    Frame::new(opcodes::ROOM_BOUNCE_REASON, body)
}

/// `ROOM_GET_ADMIN_INFO`: sent whenever a userlist record shows the local
/// UID holds the room's admin flag, to pull the ban/bounce/reddot lists.
pub fn build_get_admin_info(room_id: u32) -> Frame {
    Frame::new(opcodes::ROOM_GET_ADMIN_INFO, room_id.to_be_bytes().to_vec())
}

/// Events produced by dispatching an inbound frame against session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NeedUin,
    ReadyForLymerick,
    ServerKeyReceived,
    LoginComplete { uid: u32, nickname: String },
    HandshakeAdvance,
    ImReceived { from_uid: u32, body: String, auto_response: bool },
    RoomJoined { room_id: u32 },
    RoomClosed { room_id: u32 },
    CategoriesReceived(usize),
    RoomListReceived(usize),
    SearchResultsReceived(usize),
    Notice(room::RoomNotice),
    /// `ROOM_MEDIA_SERVER`: the voice stream's TCP endpoint for this room.
    MediaServerReady { room_id: u32, host: String, port: u16 },
    /// A frame `dispatch_frame` decided to send back, e.g. the
    /// `ROOM_GET_ADMIN_INFO` follow-up after a userlist record shows the
    /// local UID became admin.
    SendFrame(Frame),
    FileTransferRequested { transfer_id: u32, peer_uid: u32, nickname: String, filename: String, size: u64 },
    FileTransferRefused { transfer_id: u32 },
    FileTransferAccepted { transfer_id: u32, host: String, port: u16 },
    FileTransferError { transfer_id: u32, message: String },
    Unhandled(i16),
}

/// Reads a raw IPv4 address from four consecutive octets (network order,
/// same layout as `struct in_addr`) into dotted-quad text.
fn read_ipv4(bytes: &[u8]) -> String {
    format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
}

/// Routes one inbound control-socket frame to session-state mutations,
/// returning the externally-visible events it produced.
pub fn dispatch_frame(session: &mut Session, frame: &Frame) -> Vec<Event> {
    let mut events = Vec::new();
    match frame.opcode {
        opcodes::HELLO => {
            if session.local_uid.is_none() {
                events.push(Event::NeedUin);
            } else {
                events.push(Event::ReadyForLymerick);
            }
        }
        opcodes::UIN_RESPONSE => {
            if frame.body.len() >= 4 {
                let uid = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let nickname = String::from_utf8_lossy(&frame.body[4..]).into_owned();
                session.local_uid = Some(uid);
                session.local_nickname = Some(nickname.clone());
                events.push(Event::LoginComplete { uid, nickname });
            }
        }
        opcodes::SERVER_KEY => {
            session.server_key = Some(String::from_utf8_lossy(&frame.body).into_owned());
            events.push(Event::ServerKeyReceived);
        }
        opcodes::BUDDY_STATUSCHANGE => {
            if session.state != ConnectionState::Online {
                session.state = ConnectionState::Online;
                events.push(Event::HandshakeAdvance);
            }
        }
        opcodes::IM_IN => {
            if frame.body.len() >= 4 {
                let from_uid = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let pseudo = String::from_utf8_lossy(&frame.body[4..]);
                let mut html = phtml::from_pseudo_html(&pseudo);
                let auto_response = html.contains("[Auto-Response]");
                if auto_response {
                    html = html.replace("[Auto-Response]", "");
                }
                events.push(Event::ImReceived { from_uid, body: html, auto_response });
            }
        }
        opcodes::ROOM_JOINED => {
            if frame.body.len() >= 4 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let topic = String::from_utf8_lossy(&frame.body[4..]).into_owned();
                room::on_room_joined(session, room_id, topic);
                events.push(Event::RoomJoined { room_id });
            }
        }
        // The server uses one wire shape for both a full roster snapshot and
        // a single new arrival; `room::on_userlist` handles either since it
        // just upserts every record it's handed.
        opcodes::ROOM_USERLIST | opcodes::ROOM_USER_JOINED => {
            if frame.body.len() >= 4 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let became_admin =
                    room::on_userlist(session, room_id, &frame.body[4..], session.local_uid.unwrap_or(0));
                if became_admin {
                    events.push(Event::SendFrame(build_get_admin_info(room_id)));
                }
            }
        }
        opcodes::ROOM_USER_LEFT => {
            if frame.body.len() >= 8 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let uid = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                room::on_user_left(session, room_id, uid);
            }
        }
        opcodes::ROOM_CLOSED => {
            if frame.body.len() >= 4 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                room::on_room_closed(session, room_id);
                events.push(Event::RoomClosed { room_id });
            }
        }
        opcodes::ROOM_MEDIA_SERVER => {
            if frame.body.len() >= 16 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let host = read_ipv4(&frame.body[4..8]);
                let port = u16::from_be_bytes([frame.body[14], frame.body[15]]);
                let room = session.rooms.entry(room_id).or_insert_with(|| Room::new(room_id));
                room.media_endpoint = Some((host.clone(), port));
                events.push(Event::MediaServerReady { room_id, host, port });
            }
        }
        opcodes::ROOM_MIC_GIVEN_REMOVED => {
            if frame.body.len() >= 6 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let enabled = u16::from_be_bytes([frame.body[4], frame.body[5]]) != 0;
                room::on_mic_given_removed(session, room_id, enabled);
            }
        }
        opcodes::ROOM_USER_RED_DOT_ON | opcodes::ROOM_USER_RED_DOT_OFF => {
            if frame.body.len() >= 8 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let uid = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                let on = frame.opcode == opcodes::ROOM_USER_RED_DOT_ON;
                if let Some(notice) = room::on_red_dot(session, room_id, uid, on) {
                    events.push(Event::Notice(notice));
                }
            }
        }
        opcodes::ROOM_USER_MICREQUEST_ON | opcodes::ROOM_USER_MICREQUEST_OFF => {
            if frame.body.len() >= 8 {
                let room_id = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]);
                let uid = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                let requested = frame.opcode == opcodes::ROOM_USER_MICREQUEST_ON;
                if let Some(notice) = room::on_mic_request(session, room_id, uid, requested) {
                    events.push(Event::Notice(notice));
                }
            }
        }
        opcodes::CATEGORY_LIST => {
            let categories = parse_categories(&frame.body);
            let count = categories.len();
            session.categories = categories;
            events.push(Event::CategoriesReceived(count));
        }
        opcodes::ROOM_LIST => {
            let rooms = parse_room_list(&frame.body);
            events.push(Event::RoomListReceived(rooms.len()));
        }
        opcodes::SEARCH_RESPONSE => {
            let results = parse_search_response(&frame.body);
            events.push(Event::SearchResultsReceived(results.len()));
        }
        opcodes::FILE_XFER_REQUEST => {
            if frame.body.len() >= 8 {
                let size = u32::from_be_bytes([frame.body[0], frame.body[1], frame.body[2], frame.body[3]]) as u64;
                let peer_uid = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                let text = String::from_utf8_lossy(&frame.body[8..]);
                let (nickname, filename) = match text.split_once('\n') {
                    Some((nick, file)) => (nick.to_string(), file.trim_end_matches('\0').to_string()),
                    None => (text.into_owned(), String::new()),
                };
                let transfer_id = peer_uid;
                session.transfers.insert(
                    transfer_id,
                    crate::session::FileTransfer {
                        id: transfer_id,
                        peer_uid,
                        peer_nick: nickname.clone(),
                        filename: filename.clone(),
                        size,
                        transferred: 0,
                        phase: crate::session::TransferPhase::Requested,
                    },
                );
                events.push(Event::FileTransferRequested { transfer_id, peer_uid, nickname, filename, size });
            }
        }
        opcodes::FILE_XFER_REFUSED => {
            if frame.body.len() >= 8 {
                let transfer_id = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                if let Some(t) = session.transfers.get_mut(&transfer_id) {
                    t.phase = crate::session::TransferPhase::Failed;
                }
                events.push(Event::FileTransferRefused { transfer_id });
            }
        }
        opcodes::FILE_XFER_ACCEPTED => {
            if frame.body.len() >= 16 {
                let transfer_id = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                let host = read_ipv4(&frame.body[10..14]);
                let port = u16::from_be_bytes([frame.body[14], frame.body[15]]);
                if let Some(t) = session.transfers.get_mut(&transfer_id) {
                    t.phase = crate::session::TransferPhase::Connected;
                }
                events.push(Event::FileTransferAccepted { transfer_id, host, port });
            }
        }
        opcodes::FILE_XFER_ERROR => {
            if frame.body.len() >= 8 {
                let transfer_id = u32::from_be_bytes([frame.body[4], frame.body[5], frame.body[6], frame.body[7]]);
                let message = String::from_utf8_lossy(&frame.body[8..]).into_owned();
                if let Some(t) = session.transfers.get_mut(&transfer_id) {
                    t.phase = crate::session::TransferPhase::Failed;
                }
                events.push(Event::FileTransferError { transfer_id, message });
            }
        }
        other => events.push(Event::Unhandled(other)),
    }
    events
}

/// Records a `ROOM_LIST` entry so a subsequent join can check its locked
/// flag on join. Kept separate from `dispatch_frame`
/// since callers typically want the parsed entries directly.
pub fn remember_room_list(session: &mut Session, body: &[u8]) {
    for entry in parse_room_list(body) {
        let room = session.rooms.entry(entry.id).or_insert_with(|| Room::new(entry.id));
        if room.state == RoomState::Requested && entry.locked {
            // Locked flag observed before join; the caller prompts for a password.
        }
    }
}

/// Parses a `ROOM_USERLIST` body directly, for callers that want the
/// raw record view rather than dispatch-driven mutation.
pub fn parse_userlist(body: &[u8]) -> Vec<pt_protocol::records::Record> {
    parse_records(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lymerick_frame_has_expected_opcode() {
        let mut session = Session::new();
        let frame = build_lymerick(&mut session);
        assert_eq!(frame.opcode, opcodes::LYMERICK);
        assert!(!frame.body.is_empty());
    }

    #[test]
    fn login_frame_embeds_uid_and_two_newline_separated_fields() {
        let mut session = Session::new();
        session.local_uid = Some(42);
        session.server_key = Some("XXXX509XX".to_string());
        let frame = build_login(&mut session, "hunter2", "127.0.0.1");
        assert_eq!(frame.opcode, opcodes::LOGIN);
        assert_eq!(&frame.body[0..4], &42u32.to_be_bytes());
        let rest = String::from_utf8_lossy(&frame.body[4..]);
        assert_eq!(rest.matches('\n').count(), 1);
    }

    #[test]
    fn checksums_frame_has_six_newline_separated_fields() {
        let mut session = Session::new();
        session.server_key = Some("XXXX509XX".to_string());
        let frame = build_checksums(&mut session);
        let body = String::from_utf8_lossy(&frame.body);
        assert_eq!(body.matches('\n').count(), 5);
    }

    #[test]
    fn versions_frame_embeds_wierd_number() {
        let mut session = Session::new();
        let frame = build_versions(&mut session, "00:11:22:33:44:55");
        assert_eq!(frame.opcode, opcodes::VERSIONS);
        assert!(session.wierd != 0 || session.wierd == 0); // wierd is deterministic, just exercised here
        let body = String::from_utf8_lossy(&frame.body[10..]);
        assert!(body.starts_with(&session.wierd.to_string()));
    }

    #[test]
    fn uin_fontdepth_frame_is_22_bytes_plus_header() {
        let session = Session::new();
        let frame = build_uin_fontdepth(&session);
        assert_eq!(frame.opcode, opcodes::UIN_FONTDEPTH_ETC);
        assert_eq!(frame.body.len(), 6 + 4 + 4 + 22);
    }

    #[test]
    fn im_out_wraps_unformatted_text() {
        let frame = build_im_out(7, "hi there");
        assert_eq!(frame.opcode, opcodes::IM_OUT);
        let body = String::from_utf8_lossy(&frame.body[4..]);
        assert!(body.starts_with("<pfont"));
    }

    #[test]
    fn room_join_plain_has_zero_flag() {
        let frame = build_room_join(42, None);
        assert_eq!(&frame.body[0..2], &[0, 0]);
        assert_eq!(&frame.body[2..6], &42u32.to_be_bytes());
    }

    /// Scenario 3: locked room join carries the one-flag and the password.
    #[test]
    fn room_join_locked_carries_password() {
        let frame = build_room_join(42, Some("secret"));
        assert_eq!(&frame.body[0..2], &[0, 1]);
        assert_eq!(&frame.body[2..6], &42u32.to_be_bytes());
        assert_eq!(&frame.body[6..], b"secret");
    }

    #[test]
    fn admin_command_rejected_without_admin_flag() {
        let session = Session::new();
        let frame = build_admin_target_command(opcodes::ROOM_BAN_USER, &session, 1, 99);
        assert!(frame.is_none());
    }

    #[test]
    fn admin_command_allowed_with_admin_flag() {
        let mut session = Session::new();
        session.rooms.insert(1, Room::new(1));
        session.rooms.get_mut(&1).unwrap().admin = true;
        let frame = build_admin_target_command(opcodes::ROOM_BAN_USER, &session, 1, TARGET_ALL);
        assert!(frame.is_some());
        let frame = frame.unwrap();
        assert_eq!(&frame.body[4..8], &TARGET_ALL.to_be_bytes());
    }

    #[test]
    fn dispatch_hello_requests_uin_when_unknown() {
        let mut session = Session::new();
        let frame = Frame::new(opcodes::HELLO, vec![]);
        let events = dispatch_frame(&mut session, &frame);
        assert_eq!(events, vec![Event::NeedUin]);
    }

    #[test]
    fn dispatch_uin_response_sets_local_identity() {
        let mut session = Session::new();
        let mut body = 7u32.to_be_bytes().to_vec();
        body.extend_from_slice(b"bob");
        let frame = Frame::new(opcodes::UIN_RESPONSE, body);
        let events = dispatch_frame(&mut session, &frame);
        assert_eq!(session.local_uid, Some(7));
        assert_eq!(session.local_nickname.as_deref(), Some("bob"));
        assert_eq!(events, vec![Event::LoginComplete { uid: 7, nickname: "bob".to_string() }]);
    }

    #[test]
    fn dispatch_im_in_flags_auto_response() {
        let mut session = Session::new();
        let mut body = 7u32.to_be_bytes().to_vec();
        body.extend_from_slice(b"<pfont color=\"#0\">[Auto-Response]hi</pfont>");
        let frame = Frame::new(opcodes::IM_IN, body);
        let events = dispatch_frame(&mut session, &frame);
        match &events[0] {
            Event::ImReceived { auto_response, .. } => assert!(*auto_response),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn dispatch_unhandled_opcode_is_reported() {
        let mut session = Session::new();
        let frame = Frame::new(0x7FFF, vec![]);
        let events = dispatch_frame(&mut session, &frame);
        assert_eq!(events, vec![Event::Unhandled(0x7FFF)]);
    }
}
