//! User search. `DO_SEARCH`'s body is `"<key>=<value>"` with
//! `key` in {`email`, `nickname`}; `SEARCH_RESPONSE`'s body is a
//! `BSEP`-separated table of user records, reusing the same record
//! grammar as room-list and user-list.

use pt_protocol::records::parse_records;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Email,
    Nickname,
}

impl SearchKey {
    fn as_str(self) -> &'static str {
        match self {
            SearchKey::Email => "email",
            SearchKey::Nickname => "nickname",
        }
    }
}

/// Builds the `DO_SEARCH` body for the given key/value pair.
pub fn build_search_query(key: SearchKey, value: &str) -> Vec<u8> {
    format!("{}={}", key.as_str(), value).into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub uid: u32,
    pub nickname: String,
    pub email: String,
}

/// Parses a `SEARCH_RESPONSE` body into result records.
pub fn parse_search_response(body: &[u8]) -> Vec<SearchResult> {
    parse_records(body)
        .into_iter()
        .filter_map(|record| {
            let uid = record.get("uin").or_else(|| record.get("uid"))?.parse::<u32>().ok()?;
            let nickname = record.get("nickname").unwrap_or_default().to_string();
            let email = record.get("email").unwrap_or_default().to_string();
            Some(SearchResult { uid, nickname, email })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_email_query() {
        let body = build_search_query(SearchKey::Email, "bob@example.com");
        assert_eq!(body, b"email=bob@example.com");
    }

    #[test]
    fn builds_nickname_query() {
        let body = build_search_query(SearchKey::Nickname, "bob");
        assert_eq!(body, b"nickname=bob");
    }

    #[test]
    fn parses_search_response_records() {
        let body = b"uin=7\nnickname=bob\nemail=bob@example.com";
        let results = parse_search_response(body);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].uid, 7);
        assert_eq!(results[0].nickname, "bob");
        assert_eq!(results[0].email, "bob@example.com");
    }

    #[test]
    fn parses_multiple_results() {
        let mut body = b"uin=1\nnickname=a".to_vec();
        body.push(pt_protocol::records::BSEP);
        body.extend_from_slice(b"uin=2\nnickname=b");
        let results = parse_search_response(&body);
        assert_eq!(results.len(), 2);
    }
}
