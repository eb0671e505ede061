//! The ~80-entry opcode table. Values are reproduced verbatim from the
//! reverse-engineered wire protocol; they are load-bearing and must not
//! be renumbered.

/// Same encoding as `PACKET_FILE_XFER_RECV_INIT`; kept as a separate name
/// because the two are semantically distinct client-side operations that
/// happen to share a wire value in the source.
pub const FILE_XFER_RECV_INIT: i16 = 0x0000;
pub const FILE_XFER_REJECT: i16 = -5002;
pub const FILE_XFER_SEND_INIT: i16 = -5001;
pub const GET_SERVICE_URL: i16 = -2600;
pub const VERSION_INFO: i16 = -2128;
pub const CHECKSUMS: i16 = -2123;
pub const ECHO_RESPONSE: i16 = -2103;
pub const VERSIONS: i16 = -2102;
pub const UIN_FONTDEPTH_ETC: i16 = -2100;
pub const LOGIN: i16 = -1148;
pub const GET_UIN: i16 = -1131;
pub const LYMERICK: i16 = -1130;
pub const ROOM_CLOSE: i16 = -940;
pub const ROOM_NEW_USER_MIC: i16 = -932;
pub const ROOM_RED_DOT_VIDEO: i16 = -931;
pub const ROOM_RED_DOT_TEXT: i16 = -930;
pub const ROOM_UNBAN_USER: i16 = -921;
pub const ROOM_BAN_USER: i16 = -920;
pub const ROOM_UNBOUNCE_USER: i16 = -911;
pub const ROOM_GET_ADMIN_INFO: i16 = -900;
pub const CHANGE_STATUS: i16 = -620;
pub const UNBLOCK_BUDDY: i16 = -520;
pub const BLOCK_BUDDY: i16 = -500;
pub const EMAIL_VERIFICATION: i16 = -432;
pub const ROOM_UNREQUEST_MIC: i16 = -399;
pub const ROOM_REQUEST_MIC: i16 = -398;
pub const ROOM_UNRED_DOT_USER: i16 = -397;
pub const ROOM_BOUNCE_REASON: i16 = -390;
pub const ROOM_MEDIA_SERVER_ACK: i16 = -383;
pub const ROOM_REMOVE_ALL_HANDS: i16 = -382;
pub const ROOM_RED_DOT_USER: i16 = -381;
pub const ROOM_BOUNCE_USER: i16 = -380;
pub const ROOM_INVITE_OUT: i16 = -360;
pub const ROOM_TOGGLE_ALL_MICS: i16 = -355;
pub const ROOM_SET_TOPIC: i16 = -351;
pub const ROOM_MESSAGE_OUT: i16 = -350;
pub const DO_LIST_CATEGORY: i16 = -330;
pub const ROOM_LEAVE: i16 = -320;
pub const ROOM_JOIN_AS_ADMIN: i16 = -316;
pub const ROOM_JOIN: i16 = -310;
pub const ROOM_PRIVATE_INVITE: i16 = -302;
pub const LOGIN_NOT_COMPLETED: i16 = -160;
pub const REDIRECT: i16 = -119;
pub const HELLO: i16 = -117;
pub const CLIENT_HELLO: i16 = -100;
/// Client-to-server search request; collides on the wire with
/// [`SEARCH_ERROR`] and must be disambiguated by direction.
pub const DO_SEARCH: i16 = -69;
/// Server-to-client search failure; same wire value as [`DO_SEARCH`].
pub const SEARCH_ERROR: i16 = -69;
pub const ADD_BUDDY: i16 = -67;
pub const REMOVE_BUDDY: i16 = -66;
pub const ANNOUNCEMENT: i16 = -39;
pub const IM_OUT: i16 = -20;
pub const IM_IN: i16 = 0x0014;
pub const MAINTENANCE_KICK: i16 = 0x002A;
pub const BUDDY_REMOVED: i16 = 0x0042;
pub const BUDDY_LIST: i16 = 0x0043;
pub const SEARCH_RESPONSE: i16 = 0x0045;
pub const LOOKAHEAD: i16 = 0x0064;
pub const UPGRADE: i16 = 0x0078;
pub const ROOM_JOINED: i16 = 0x0136;
pub const ROOM_USER_JOINED: i16 = 0x0137;
pub const ROOM_TRANSMITTING_VIDEO: i16 = 0x0138;
pub const ROOM_MEDIA_SERVER: i16 = 0x013B;
pub const ROOM_USER_LEFT: i16 = 0x0140;
pub const ROOM_LIST: i16 = 0x014C;
pub const ROOM_USERLIST: i16 = 0x0154;
pub const ROOM_MESSAGE_IN: i16 = 0x015E;
pub const ROOM_TOPIC: i16 = 0x015F;
pub const ROOM_MIC_GIVEN_REMOVED: i16 = 0x0163;
pub const ROOM_INVITE_IN: i16 = 0x0168;
pub const ROOM_CLOSED: i16 = 0x017C;
pub const ROOM_USER_RED_DOT_ON: i16 = 0x017D;
pub const ROOM_USER_MUTE: i16 = 0x017F;
pub const ROOM_USER_RED_DOT_OFF: i16 = 0x018D;
pub const ROOM_USER_MICREQUEST_ON: i16 = 0x018E;
pub const ROOM_USER_MICREQUEST_OFF: i16 = 0x018F;
pub const BUDDY_STATUSCHANGE: i16 = 0x0190;
pub const USER_DATA: i16 = 0x019A;
pub const CATEGORY_LIST: i16 = 0x019C;
pub const BLOCK_SUCCESSFUL: i16 = 0x01F4;
pub const BLOCKED_BUDDIES: i16 = 0x01FE;
pub const USER_STATUS: i16 = 0x026C;
pub const FORCED_IM: i16 = 0x0294;
pub const WM_MESSAGE: i16 = 0x02B2;
pub const ROOM_BANNER_URL: i16 = 0x0320;
pub const ROOM_ADMIN_INFO: i16 = 0x0384;
pub const SERVER_ERROR: i16 = 0x044C;
pub const UIN_RESPONSE: i16 = 0x046B;
pub const SERVER_KEY: i16 = 0x0474;
pub const LOGIN_UNKNOWN: i16 = 0x04A6;
pub const ROOM_PREMIUM: i16 = 0x0528;
pub const USER_STATS: i16 = 0x05DC;
pub const ECHO: i16 = 0x0837;
pub const ROOM_UNKNOWN_ENCODED: i16 = 0x084A;
pub const INTEROP_URL: i16 = 0x0850;
pub const POPUP_URL: i16 = 0x09C4;
pub const SERVICE_URL: i16 = 0x0A28;
pub const FILE_XFER_REQUEST: i16 = 0x1389;
pub const FILE_XFER_REFUSED: i16 = 0x138B;
pub const FILE_XFER_ACCEPTED: i16 = 0x138C;
pub const FILE_XFER_ERROR: i16 = 0x138D;

/// Protocol version echoed in every frame header.
pub const PROTOCOL_VERSION: u16 = 0x0053;

/// Buddy status values carried on `CHANGE_STATUS`/`BUDDY_STATUSCHANGE`.
pub mod status {
    pub const BLOCKED: u32 = 0xFFFF_FFFF;
    pub const OFFLINE: u32 = 0x0000_0000;
    pub const ONLINE: u32 = 0x0000_001E;
    pub const AWAY: u32 = 0x0000_0046;
    pub const DND: u32 = 0x0000_005A;
    pub const INVISIBLE: u32 = 0x0000_006E;
}

/// Target UID meaning "all participants" for ban/bounce/reddot commands.
pub const TARGET_ALL: u32 = 0xFFFF_FFFF;

/// Returns a human-readable name for diagnostic hex-dumps of unhandled
/// opcodes, falling back to a generic label.
pub fn opcode_name(opcode: i16) -> &'static str {
    match opcode {
        HELLO => "HELLO",
        REDIRECT => "REDIRECT",
        CLIENT_HELLO => "CLIENT_HELLO",
        GET_UIN => "GET_UIN",
        UIN_RESPONSE => "UIN_RESPONSE",
        LYMERICK => "LYMERICK",
        SERVER_KEY => "SERVER_KEY",
        LOGIN => "LOGIN",
        LOGIN_NOT_COMPLETED => "LOGIN_NOT_COMPLETED",
        CHECKSUMS => "CHECKSUMS",
        VERSIONS => "VERSIONS",
        UIN_FONTDEPTH_ETC => "UIN_FONTDEPTH_ETC",
        VERSION_INFO => "VERSION_INFO",
        BUDDY_STATUSCHANGE => "BUDDY_STATUSCHANGE",
        IM_OUT => "IM_OUT",
        IM_IN => "IM_IN",
        FORCED_IM => "FORCED_IM",
        ANNOUNCEMENT => "ANNOUNCEMENT",
        ADD_BUDDY => "ADD_BUDDY",
        REMOVE_BUDDY => "REMOVE_BUDDY",
        BUDDY_LIST => "BUDDY_LIST",
        BUDDY_REMOVED => "BUDDY_REMOVED",
        BLOCK_BUDDY => "BLOCK_BUDDY",
        UNBLOCK_BUDDY => "UNBLOCK_BUDDY",
        BLOCKED_BUDDIES => "BLOCKED_BUDDIES",
        ROOM_JOIN => "ROOM_JOIN",
        ROOM_JOIN_AS_ADMIN => "ROOM_JOIN_AS_ADMIN",
        ROOM_JOINED => "ROOM_JOINED",
        ROOM_LEAVE => "ROOM_LEAVE",
        ROOM_CLOSE => "ROOM_CLOSE",
        ROOM_CLOSED => "ROOM_CLOSED",
        ROOM_USERLIST => "ROOM_USERLIST",
        ROOM_USER_JOINED => "ROOM_USER_JOINED",
        ROOM_USER_LEFT => "ROOM_USER_LEFT",
        ROOM_TOPIC => "ROOM_TOPIC",
        ROOM_SET_TOPIC => "ROOM_SET_TOPIC",
        ROOM_MESSAGE_IN => "ROOM_MESSAGE_IN",
        ROOM_MESSAGE_OUT => "ROOM_MESSAGE_OUT",
        ROOM_MEDIA_SERVER => "ROOM_MEDIA_SERVER",
        ROOM_MEDIA_SERVER_ACK => "ROOM_MEDIA_SERVER_ACK",
        ROOM_GET_ADMIN_INFO => "ROOM_GET_ADMIN_INFO",
        ROOM_ADMIN_INFO => "ROOM_ADMIN_INFO",
        ROOM_BAN_USER => "ROOM_BAN_USER",
        ROOM_UNBAN_USER => "ROOM_UNBAN_USER",
        ROOM_BOUNCE_USER => "ROOM_BOUNCE_USER",
        ROOM_UNBOUNCE_USER => "ROOM_UNBOUNCE_USER",
        ROOM_BOUNCE_REASON => "ROOM_BOUNCE_REASON",
        ROOM_RED_DOT_USER => "ROOM_RED_DOT_USER",
        ROOM_UNRED_DOT_USER => "ROOM_UNRED_DOT_USER",
        ROOM_USER_RED_DOT_ON => "ROOM_USER_RED_DOT_ON",
        ROOM_USER_RED_DOT_OFF => "ROOM_USER_RED_DOT_OFF",
        ROOM_REQUEST_MIC => "ROOM_REQUEST_MIC",
        ROOM_UNREQUEST_MIC => "ROOM_UNREQUEST_MIC",
        ROOM_USER_MICREQUEST_ON => "ROOM_USER_MICREQUEST_ON",
        ROOM_USER_MICREQUEST_OFF => "ROOM_USER_MICREQUEST_OFF",
        ROOM_MIC_GIVEN_REMOVED => "ROOM_MIC_GIVEN_REMOVED",
        ROOM_TOGGLE_ALL_MICS => "ROOM_TOGGLE_ALL_MICS",
        ROOM_REMOVE_ALL_HANDS => "ROOM_REMOVE_ALL_HANDS",
        ROOM_INVITE_IN => "ROOM_INVITE_IN",
        ROOM_INVITE_OUT => "ROOM_INVITE_OUT",
        ROOM_PRIVATE_INVITE => "ROOM_PRIVATE_INVITE",
        ROOM_USER_MUTE => "ROOM_USER_MUTE",
        ROOM_NEW_USER_MIC => "ROOM_NEW_USER_MIC",
        ROOM_TRANSMITTING_VIDEO => "ROOM_TRANSMITTING_VIDEO",
        ROOM_RED_DOT_TEXT => "ROOM_RED_DOT_TEXT",
        ROOM_RED_DOT_VIDEO => "ROOM_RED_DOT_VIDEO",
        ROOM_PREMIUM => "ROOM_PREMIUM",
        ROOM_BANNER_URL => "ROOM_BANNER_URL",
        ROOM_UNKNOWN_ENCODED => "ROOM_UNKNOWN_ENCODED",
        DO_LIST_CATEGORY => "DO_LIST_CATEGORY",
        CATEGORY_LIST => "CATEGORY_LIST",
        ROOM_LIST => "ROOM_LIST",
        DO_SEARCH => "DO_SEARCH/SEARCH_ERROR",
        SEARCH_RESPONSE => "SEARCH_RESPONSE",
        FILE_XFER_REQUEST => "FILE_XFER_REQUEST",
        FILE_XFER_ACCEPTED => "FILE_XFER_ACCEPTED",
        FILE_XFER_REFUSED => "FILE_XFER_REFUSED",
        FILE_XFER_ERROR => "FILE_XFER_ERROR",
        FILE_XFER_SEND_INIT => "FILE_XFER_SEND_INIT",
        FILE_XFER_REJECT => "FILE_XFER_REJECT/FILE_XFER_RECV_INIT",
        GET_SERVICE_URL => "GET_SERVICE_URL",
        SERVICE_URL => "SERVICE_URL",
        INTEROP_URL => "INTEROP_URL",
        POPUP_URL => "POPUP_URL",
        CHANGE_STATUS => "CHANGE_STATUS",
        EMAIL_VERIFICATION => "EMAIL_VERIFICATION",
        MAINTENANCE_KICK => "MAINTENANCE_KICK",
        LOOKAHEAD => "LOOKAHEAD",
        UPGRADE => "UPGRADE",
        USER_DATA => "USER_DATA",
        USER_STATUS => "USER_STATUS",
        USER_STATS => "USER_STATS",
        WM_MESSAGE => "WM_MESSAGE",
        SERVER_ERROR => "SERVER_ERROR",
        LOGIN_UNKNOWN => "LOGIN_UNKNOWN",
        ECHO => "ECHO",
        ECHO_RESPONSE => "ECHO_RESPONSE",
        BLOCK_SUCCESSFUL => "BLOCK_SUCCESSFUL",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn im_out_matches_scenario_opcode() {
        assert_eq!(IM_OUT, -20);
    }

    #[test]
    fn do_search_and_search_error_collide_by_design() {
        assert_eq!(DO_SEARCH, SEARCH_ERROR);
    }

    #[test]
    fn unknown_opcode_name_falls_back() {
        assert_eq!(opcode_name(0x7FFF), "UNKNOWN");
    }
}
