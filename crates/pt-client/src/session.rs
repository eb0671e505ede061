//! Session-wide data model: buddies, categories, rooms, voice streams, and
//! file transfers, mirroring the original client's `PTData`/`PTRoomData`/
//! `PTCategory`/`PTIm`/`PTXferData` structs as plain owned Rust state kept
//! by the main event-loop task rather than accessed through a C-style
//! global.

use std::collections::HashMap;

use crate::voice::VoiceHandle;

/// Connection lifecycle of the control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    AwaitingUin,
    AwaitingServerKey,
    AwaitingAck,
    Online,
    Disconnected,
}

/// A buddy-list entry or IM correspondent (`PTIm`).
#[derive(Debug, Clone)]
pub struct Buddy {
    pub uid: u32,
    pub nickname: String,
    pub status: u32,
    /// Set after a body containing the literal "[Auto-Response]" marker.
    pub auto_response: bool,
}

/// A chat room category (`PTCategory`).
#[derive(Debug, Clone)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// One entry in a `ROOM_LIST` response.
#[derive(Debug, Clone)]
pub struct RoomListEntry {
    pub id: u32,
    pub name: String,
    pub count: u32,
    pub locked: bool,
    pub owner: String,
}

/// A room participant record, from `ROOM_USERLIST`/`ROOM_USER_JOINED`.
#[derive(Debug, Clone)]
pub struct Participant {
    pub uid: u32,
    pub nickname: String,
    pub admin: bool,
    pub mic_requested: bool,
    pub red_dot: bool,
}

/// States of a room from the local user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Requested,
    Joined,
    Left,
    Closed,
    Kicked,
}

/// Open room state, one per joined room (`PTRoomData`).
#[derive(Debug, Clone)]
pub struct Room {
    pub id: u32,
    pub state: RoomState,
    pub topic: String,
    pub owner_uid: u32,
    /// Set when `ROOM_USERLIST`/`ROOM_USER_JOINED` shows our own UID with admin=1.
    pub admin: bool,
    pub participants: HashMap<u32, Participant>,
    pub bounce_list: Vec<u32>,
    pub ban_list: Vec<u32>,
    /// Current speaker's UID, cleared by the speaker-detection timer.
    pub speaker: Option<u32>,
    /// "all mics" toggle from `ROOM_MIC_GIVEN_REMOVED`.
    pub all_mics_enabled: bool,
    /// `reddot` scope toggles: whether reddot restricts text and/or video privileges.
    pub reddot_text: bool,
    pub reddot_video: bool,
    pub media_endpoint: Option<(String, u16)>,
    /// `/mute` toggle for this room's playback, independent of `speaker`.
    pub muted: bool,
}

impl Room {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: RoomState::Requested,
            topic: String::new(),
            owner_uid: 0,
            admin: false,
            participants: HashMap::new(),
            bounce_list: Vec::new(),
            ban_list: Vec::new(),
            speaker: None,
            all_mics_enabled: true,
            reddot_text: false,
            reddot_video: false,
            media_endpoint: None,
            muted: false,
        }
    }
}

/// Phase of an in-progress file transfer (`PTXferData::phase`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Requested,
    Connected,
    Introduced,
    Authenticated,
    Sending,
    Complete,
    Failed,
}

/// One file transfer, inbound or outbound.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    pub id: u32,
    pub peer_uid: u32,
    pub peer_nick: String,
    pub filename: String,
    pub size: u64,
    pub transferred: u64,
    pub phase: TransferPhase,
}

/// The account's persisted identity plus the live, mutable session state
/// owned by the main event-loop task.
#[derive(Debug)]
pub struct Session {
    pub state: ConnectionState,
    pub local_uid: Option<u32>,
    pub local_nickname: Option<String>,
    pub server_key: Option<String>,
    pub wierd: i32,
    pub pseudo_time: u32,
    pub buddies: HashMap<u32, Buddy>,
    pub categories: Vec<Category>,
    pub rooms: HashMap<u32, Room>,
    pub transfers: HashMap<u32, FileTransfer>,
    /// Handles to the voice-stream actor task for each room with an open
    /// media socket, keyed by room id. The actor owns the `VoiceStream`
    /// and the socket; this side only sends it control messages.
    pub voice_handles: HashMap<u32, VoiceHandle>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            local_uid: None,
            local_nickname: None,
            server_key: None,
            wierd: 0,
            pseudo_time: 0,
            buddies: HashMap::new(),
            categories: Vec::new(),
            rooms: HashMap::new(),
            transfers: HashMap::new(),
            voice_handles: HashMap::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_connecting() {
        let session = Session::new();
        assert_eq!(session.state, ConnectionState::Connecting);
        assert!(session.local_uid.is_none());
    }

    #[test]
    fn new_room_starts_requested_with_default_all_mics() {
        let room = Room::new(42);
        assert_eq!(room.state, RoomState::Requested);
        assert!(room.all_mics_enabled);
        assert!(!room.admin);
    }
}
