//! Room state machine transitions and the per-room speaker-detection
//! timer. Mutations here run only on the main event-loop task: per-room
//! state is touched only by dispatcher and timer callbacks, never by the
//! capture or playback threads.

use std::time::{Duration, Instant};

use pt_protocol::records::parse_records;

use crate::session::{Participant, Room, RoomState, Session};

/// Idle-speaker timeout: silence longer than this clears the speaker.
pub const SPEAKER_SILENCE_TIMEOUT: Duration = Duration::from_millis(450);

/// Timer tick interval for speaker-detection.
pub const SPEAKER_TIMER_TICK: Duration = Duration::from_millis(500);

/// A notice emitted to the room's UI-visible transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomNotice {
    StartedSpeaking { uid: u32 },
    StoppedSpeaking { uid: u32 },
    RedDotOn { uid: u32 },
    RedDotOff { uid: u32 },
    MicRequestOn { uid: u32 },
    MicRequestOff { uid: u32 },
}

pub fn on_room_joined(session: &mut Session, room_id: u32, topic: String) {
    let room = session.rooms.entry(room_id).or_insert_with(|| Room::new(room_id));
    room.state = RoomState::Joined;
    room.topic = topic;
}

/// Parses a `ROOM_USERLIST` body and inserts/updates participant records.
/// Detecting the local UID with `admin=1` sets the room's admin flag; the
/// caller is responsible for following up with `ROOM_GET_ADMIN_INFO`.
pub fn on_userlist(session: &mut Session, room_id: u32, body: &[u8], local_uid: u32) -> bool {
    let room = session.rooms.entry(room_id).or_insert_with(|| Room::new(room_id));
    let mut became_admin = false;
    for record in parse_records(body) {
        let Some(uid) = record.get("uid").and_then(|v| v.parse::<u32>().ok()) else { continue };
        let nickname = record.get("nickname").unwrap_or_default().to_string();
        let admin = record.get("admin").map(|v| v == "1").unwrap_or(false);
        let mic_requested = record.get("req").map(|v| v == "1").unwrap_or(false);
        let red_dot = record.get("pub").map(|v| v == "0").unwrap_or(false);

        if uid == local_uid && admin {
            room.admin = true;
            became_admin = true;
        }

        room.participants.insert(uid, Participant { uid, nickname, admin, mic_requested, red_dot });
    }
    became_admin
}

pub fn on_user_joined(session: &mut Session, room_id: u32, participant: Participant) {
    let room = session.rooms.entry(room_id).or_insert_with(|| Room::new(room_id));
    room.participants.insert(participant.uid, participant);
}

/// `ROOM_USER_LEFT`: removes a participant; clears the speaker flag
/// immediately if the departing user was the current speaker.
pub fn on_user_left(session: &mut Session, room_id: u32, uid: u32) {
    if let Some(room) = session.rooms.get_mut(&room_id) {
        room.participants.remove(&uid);
        if room.speaker == Some(uid) {
            room.speaker = None;
        }
    }
}

pub fn on_mic_given_removed(session: &mut Session, room_id: u32, enabled: bool) {
    if let Some(room) = session.rooms.get_mut(&room_id) {
        room.all_mics_enabled = enabled;
    }
}

pub fn on_red_dot(session: &mut Session, room_id: u32, uid: u32, on: bool) -> Option<RoomNotice> {
    let room = session.rooms.get_mut(&room_id)?;
    let participant = room.participants.get_mut(&uid)?;
    participant.red_dot = on;
    Some(if on { RoomNotice::RedDotOn { uid } } else { RoomNotice::RedDotOff { uid } })
}

pub fn on_mic_request(session: &mut Session, room_id: u32, uid: u32, requested: bool) -> Option<RoomNotice> {
    let room = session.rooms.get_mut(&room_id)?;
    let participant = room.participants.get_mut(&uid)?;
    participant.mic_requested = requested;
    Some(if requested { RoomNotice::MicRequestOn { uid } } else { RoomNotice::MicRequestOff { uid } })
}

pub fn on_room_closed(session: &mut Session, room_id: u32) {
    if let Some(room) = session.rooms.get_mut(&room_id) {
        room.state = RoomState::Closed;
    }
}

/// Returns true only when the room's local `admin` flag is set; ban,
/// bounce, and reddot commands must be rejected locally otherwise.
pub fn is_admin(session: &Session, room_id: u32) -> bool {
    session.rooms.get(&room_id).map(|r| r.admin).unwrap_or(false)
}

/// Per-voice-stream speaker-detection state. `observe` is called on
/// every inbound audio packet; `tick` is called on the shared 500ms timer.
#[derive(Debug)]
pub struct SpeakerTimer {
    current_speaker: Option<u32>,
    last_packet_at: Option<Instant>,
}

impl SpeakerTimer {
    pub fn new() -> Self {
        Self { current_speaker: None, last_packet_at: None }
    }

    /// Records an inbound packet from `ssrc` at `now`. Returns paired
    /// "X stopped" / "Y started" notices when the speaker changes.
    pub fn observe(&mut self, ssrc: u32, now: Instant) -> Vec<RoomNotice> {
        let mut notices = Vec::new();
        match self.current_speaker {
            Some(current) if current == ssrc => {}
            Some(current) => {
                notices.push(RoomNotice::StoppedSpeaking { uid: current });
                notices.push(RoomNotice::StartedSpeaking { uid: ssrc });
                self.current_speaker = Some(ssrc);
            }
            None => {
                notices.push(RoomNotice::StartedSpeaking { uid: ssrc });
                self.current_speaker = Some(ssrc);
            }
        }
        self.last_packet_at = Some(now);
        notices
    }

    /// Called every `SPEAKER_TIMER_TICK`. Clears the speaker and emits a
    /// "stopped speaking" notice once silence exceeds `SPEAKER_SILENCE_TIMEOUT`.
    pub fn tick(&mut self, now: Instant) -> Option<RoomNotice> {
        let speaker = self.current_speaker?;
        let last = self.last_packet_at?;
        if now.duration_since(last) > SPEAKER_SILENCE_TIMEOUT {
            self.current_speaker = None;
            self.last_packet_at = None;
            Some(RoomNotice::StoppedSpeaking { uid: speaker })
        } else {
            None
        }
    }

    pub fn current_speaker(&self) -> Option<u32> {
        self.current_speaker
    }
}

impl Default for SpeakerTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userlist_sets_admin_flag_for_local_uid() {
        let mut session = Session::new();
        let body = b"uid=7\nnickname=bob\nadmin=1";
        let became_admin = on_userlist(&mut session, 1, body, 7);
        assert!(became_admin);
        assert!(session.rooms[&1].admin);
    }

    #[test]
    fn userlist_does_not_grant_admin_for_other_uid() {
        let mut session = Session::new();
        let body = b"uid=7\nnickname=bob\nadmin=1";
        let became_admin = on_userlist(&mut session, 1, body, 99);
        assert!(!became_admin);
        assert!(!session.rooms[&1].admin);
    }

    #[test]
    fn user_left_clears_speaker_if_current() {
        let mut session = Session::new();
        session.rooms.insert(1, Room::new(1));
        session.rooms.get_mut(&1).unwrap().speaker = Some(7);
        on_user_left(&mut session, 1, 7);
        assert!(session.rooms[&1].speaker.is_none());
    }

    #[test]
    fn is_admin_defaults_false_for_unknown_room() {
        let session = Session::new();
        assert!(!is_admin(&session, 999));
    }

    #[test]
    fn speaker_timer_emits_started_then_stopped() {
        let mut timer = SpeakerTimer::new();
        let t0 = Instant::now();
        let notices = timer.observe(42, t0);
        assert_eq!(notices, vec![RoomNotice::StartedSpeaking { uid: 42 }]);

        let later = t0 + Duration::from_millis(500);
        let tick_notice = timer.tick(later);
        assert_eq!(tick_notice, Some(RoomNotice::StoppedSpeaking { uid: 42 }));
        assert!(timer.current_speaker().is_none());
    }

    #[test]
    fn speaker_timer_does_not_clear_within_timeout() {
        let mut timer = SpeakerTimer::new();
        let t0 = Instant::now();
        timer.observe(42, t0);
        let soon = t0 + Duration::from_millis(200);
        assert_eq!(timer.tick(soon), None);
        assert_eq!(timer.current_speaker(), Some(42));
    }

    #[test]
    fn speaker_change_emits_paired_notices() {
        let mut timer = SpeakerTimer::new();
        let t0 = Instant::now();
        timer.observe(1, t0);
        let notices = timer.observe(2, t0 + Duration::from_millis(10));
        assert_eq!(
            notices,
            vec![RoomNotice::StoppedSpeaking { uid: 1 }, RoomNotice::StartedSpeaking { uid: 2 }]
        );
    }
}
