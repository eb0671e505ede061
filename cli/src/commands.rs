use anyhow::Result;
use tokio::io::AsyncWriteExt;

use pt_client::engine::{self, TARGET_ALL};
use pt_client::session::{FileTransfer, Session, TransferPhase};
use pt_client::xfer;
use pt_protocol::frame::Frame;
use pt_protocol::opcodes;

/// Slash commands recognized in chat input. Each enforces the
/// admin precondition where documented, via `engine::build_admin_target_command`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Whisper { nick: String, message: String },
    Ban { target: String },
    Unban { target: String },
    Bounce { target: String },
    Unbounce { target: String },
    RemoveMic,
    RestoreMic,
    ClearHands,
    RedDot { target: String },
    UnredDot { target: String },
    ToggleRedDotScope { scope: String },
    ShowRedDotScope,
    ListBans,
    ListBounces,
    Close,
    MicOn,
    MicOff,
    Mute,
    RequestMic,
    SendFile { nick: String, path: String },
    PlainText(String),
}

fn parse_command(line: &str) -> Command {
    if let Some(rest) = line.strip_prefix("/w ").or_else(|| line.strip_prefix("/msg ")) {
        if let Some((nick, message)) = rest.split_once(':') {
            return Command::Whisper { nick: nick.trim().to_string(), message: message.trim().to_string() };
        }
    }
    if let Some(rest) = line.strip_prefix("/sendfile ") {
        if let Some((nick, path)) = rest.split_once(' ') {
            return Command::SendFile { nick: nick.trim().to_string(), path: path.trim().to_string() };
        }
    }
    match line.trim() {
        "/ban" => return Command::Ban { target: "all".to_string() },
        "/unban" => return Command::Unban { target: "all".to_string() },
        "/bounce" => return Command::Bounce { target: "all".to_string() },
        "/unbounce" => return Command::Unbounce { target: "all".to_string() },
        "/removemic" => return Command::RemoveMic,
        "/restoremic" => return Command::RestoreMic,
        "/clearhands" => return Command::ClearHands,
        "/sre" => return Command::ShowRedDotScope,
        "/listbans" => return Command::ListBans,
        "/listbounces" => return Command::ListBounces,
        "/close" => return Command::Close,
        "/micon" => return Command::MicOn,
        "/micoff" => return Command::MicOff,
        "/mute" => return Command::Mute,
        "/reqmic" => return Command::RequestMic,
        _ => {}
    }
    if let Some(target) = line.strip_prefix("/reddot ") {
        return Command::RedDot { target: target.trim().to_string() };
    }
    if let Some(target) = line.strip_prefix("/unreddot ") {
        return Command::UnredDot { target: target.trim().to_string() };
    }
    if let Some(scope) = line.strip_prefix("/re ") {
        return Command::ToggleRedDotScope { scope: scope.trim().to_string() };
    }
    Command::PlainText(line.to_string())
}

fn resolve_target_uid(session: &Session, room_id: u32, target: &str) -> Option<u32> {
    if target.eq_ignore_ascii_case("all") {
        return Some(TARGET_ALL);
    }
    session
        .rooms
        .get(&room_id)?
        .participants
        .values()
        .find(|p| p.nickname == target)
        .map(|p| p.uid)
}

/// Current room context for command dispatch: this CLI is single-room at
/// a time, since admin commands are scoped per room.
fn active_room_id(session: &Session) -> Option<u32> {
    session.rooms.keys().next().copied()
}

pub async fn handle_input_line<W: AsyncWriteExt + Unpin>(
    session: &mut Session,
    line: &str,
    writer: &mut W,
) -> Result<()> {
    let command = parse_command(line);
    let room_id = active_room_id(session);

    let frame = match command {
        Command::Whisper { nick, message } => {
            let uid = room_id.and_then(|r| resolve_target_uid(session, r, &nick));
            uid.map(|uid| engine::build_im_out(uid, &message))
        }
        Command::Ban { target } => admin_command(session, room_id, &target, opcodes::ROOM_BAN_USER),
        Command::Unban { target } => admin_command(session, room_id, &target, opcodes::ROOM_UNBAN_USER),
        Command::Bounce { target } => admin_command(session, room_id, &target, opcodes::ROOM_BOUNCE_USER),
        Command::Unbounce { target } => admin_command(session, room_id, &target, opcodes::ROOM_UNBOUNCE_USER),
        Command::RedDot { target } => admin_command(session, room_id, &target, opcodes::ROOM_RED_DOT_USER),
        Command::UnredDot { target } => admin_command(session, room_id, &target, opcodes::ROOM_UNRED_DOT_USER),
        Command::RemoveMic => room_id.map(|r| Frame::new(opcodes::ROOM_NEW_USER_MIC, r.to_be_bytes().to_vec())),
        Command::RestoreMic => room_id.map(|r| Frame::new(opcodes::ROOM_TOGGLE_ALL_MICS, r.to_be_bytes().to_vec())),
        Command::ClearHands => room_id.map(|r| Frame::new(opcodes::ROOM_REMOVE_ALL_HANDS, r.to_be_bytes().to_vec())),
        Command::ToggleRedDotScope { scope } => {
            let opcode = if scope == "video" { opcodes::ROOM_RED_DOT_VIDEO } else { opcodes::ROOM_RED_DOT_TEXT };
            room_id.map(|r| Frame::new(opcode, r.to_be_bytes().to_vec()))
        }
        Command::ShowRedDotScope => {
            if let Some(r) = room_id.and_then(|r| session.rooms.get(&r)) {
                println!("reddot scope: text={} video={}", r.reddot_text, r.reddot_video);
            }
            None
        }
        Command::ListBans => {
            if let Some(r) = room_id.and_then(|r| session.rooms.get(&r)) {
                println!("banned: {:?}", r.ban_list);
            }
            None
        }
        Command::ListBounces => {
            if let Some(r) = room_id.and_then(|r| session.rooms.get(&r)) {
                println!("bounced: {:?}", r.bounce_list);
            }
            None
        }
        Command::Close => room_id.map(|r| Frame::new(opcodes::ROOM_CLOSE, r.to_be_bytes().to_vec())),
        Command::MicOn => {
            let handle = room_id.and_then(|r| session.voice_handles.get(&r));
            match handle {
                Some(handle) => match pt_audio::CaptureDevice::open(None) {
                    Ok(capture) => handle.start_transmitting(capture),
                    Err(e) => println!("could not open capture device: {e}"),
                },
                None => println!("no voice stream open in this room"),
            }
            None
        }
        Command::MicOff => {
            if let Some(handle) = room_id.and_then(|r| session.voice_handles.get(&r)) {
                handle.stop_transmitting();
            }
            None
        }
        Command::Mute => {
            if let Some(r) = room_id {
                let muted = session.rooms.get_mut(&r).map(|room| {
                    room.muted = !room.muted;
                    room.muted
                });
                if let Some(muted) = muted {
                    if let Some(handle) = session.voice_handles.get(&r) {
                        handle.set_muted(muted);
                    }
                }
            }
            None
        }
        Command::RequestMic => room_id.map(|r| Frame::new(opcodes::ROOM_REQUEST_MIC, r.to_be_bytes().to_vec())),
        Command::SendFile { nick, path } => {
            let local_uid = session.local_uid.unwrap_or(0);
            let uid = room_id.and_then(|r| resolve_target_uid(session, r, &nick));
            match (uid, tokio::fs::metadata(&path).await) {
                (Some(peer_uid), Ok(meta)) => {
                    let filename = std::path::Path::new(&path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    // `transfers[peer_uid].filename` keeps the local path so the
                    // later transfer task can re-open it; the wire only ever
                    // sees the basename computed here and in `build_send_line`.
                    session.transfers.insert(
                        peer_uid,
                        FileTransfer {
                            id: peer_uid,
                            peer_uid,
                            peer_nick: nick,
                            filename: path.clone(),
                            size: meta.len(),
                            transferred: 0,
                            phase: TransferPhase::Requested,
                        },
                    );
                    Some(xfer::build_send_init(local_uid, &filename))
                }
                (None, _) => {
                    println!("no such user in this room: {nick}");
                    None
                }
                (_, Err(e)) => {
                    println!("could not read {path}: {e}");
                    None
                }
            }
        }
        Command::PlainText(text) => {
            let uid = room_id.unwrap_or(0);
            Some(Frame::new(opcodes::ROOM_MESSAGE_OUT, {
                let mut body = uid.to_be_bytes().to_vec();
                body.extend_from_slice(pt_protocol::phtml::to_pseudo_html(&text).as_bytes());
                body
            }))
        }
    };

    if let Some(frame) = frame {
        writer.write_all(&frame.to_bytes()?).await?;
    }
    Ok(())
}

fn admin_command(session: &Session, room_id: Option<u32>, target: &str, opcode: i16) -> Option<Frame> {
    let room_id = room_id?;
    let uid = resolve_target_uid(session, room_id, target)?;
    engine::build_admin_target_command(opcode, session, room_id, uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whisper_command() {
        let cmd = parse_command("/w bob: hey there");
        assert_eq!(cmd, Command::Whisper { nick: "bob".to_string(), message: "hey there".to_string() });
    }

    #[test]
    fn parses_ban_command_with_implicit_all() {
        assert_eq!(parse_command("/ban"), Command::Ban { target: "all".to_string() });
    }

    #[test]
    fn parses_reddot_with_target() {
        assert_eq!(parse_command("/reddot alice"), Command::RedDot { target: "alice".to_string() });
    }

    #[test]
    fn unrecognized_line_is_plain_text() {
        assert_eq!(parse_command("hello room"), Command::PlainText("hello room".to_string()));
    }

    #[test]
    fn resolve_target_uid_handles_all_target() {
        let session = Session::new();
        assert_eq!(resolve_target_uid(&session, 1, "all"), Some(TARGET_ALL));
    }
}
