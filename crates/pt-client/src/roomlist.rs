//! Category and room-list parsing. `CATEGORY_LIST`'s body is a
//! `BSEP`-separated list of `id,name` pairs; `ROOM_LIST`'s body (per
//! category, requested via `DO_LIST_CATEGORY`) is a `BSEP`-separated list
//! of `id,name,count,l,owner` records sharing the same record grammar as
//! the user-list and search response.

use pt_protocol::records::parse_records;

use crate::session::{Category, RoomListEntry};

/// Parses a `CATEGORY_LIST` body into categories.
pub fn parse_categories(body: &[u8]) -> Vec<Category> {
    parse_records(body)
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id")?.parse::<u32>().ok()?;
            let name = record.get("name")?.to_string();
            Some(Category { id, name })
        })
        .collect()
}

/// Parses a `ROOM_LIST` body into room entries, preserving the `l`
/// (locked) flag the room-join flow checks before prompting for a password.
pub fn parse_room_list(body: &[u8]) -> Vec<RoomListEntry> {
    parse_records(body)
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id")?.parse::<u32>().ok()?;
            let name = record.get("name").unwrap_or_default().to_string();
            let count = record.get("count").and_then(|v| v.parse().ok()).unwrap_or(0);
            let locked = record.get("l").map(|v| v == "1").unwrap_or(false);
            let owner = record.get("owner").unwrap_or_default().to_string();
            Some(RoomListEntry { id, name, count, locked, owner })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_list() {
        let body = pt_protocol::records::encode_records(&pt_protocol::records::parse_records(
            b"id=1\nname=Music",
        ));
        let categories = parse_categories(&body);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, 1);
        assert_eq!(categories[0].name, "Music");
    }

    #[test]
    fn parses_room_list_with_locked_flag() {
        let body = b"id=42\nname=Lounge\ncount=9\nl=1\nowner=bob";
        let rooms = parse_room_list(body);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, 42);
        assert!(rooms[0].locked);
        assert_eq!(rooms[0].owner, "bob");
    }

    #[test]
    fn unlocked_room_has_locked_false() {
        let body = b"id=1\nname=Open\ncount=2\nl=0\nowner=alice";
        let rooms = parse_room_list(body);
        assert!(!rooms[0].locked);
    }

    #[test]
    fn missing_id_is_skipped() {
        let body = b"name=NoId";
        assert!(parse_room_list(body).is_empty());
    }
}
