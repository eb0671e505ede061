//! Shared `BSEP`/`FSEP` record grammar backing room-list, user-list, and
//! search response bodies. All three wire formats
//! are a list of records separated by the single byte `0xC8` (BSEP), each
//! record a list of `key=value` fields separated by `\n` (FSEP).

pub const BSEP: u8 = 0xC8;
pub const FSEP: u8 = b'\n';

/// One parsed `key=value` record, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Splits a body on `BSEP` into records, then each record on `FSEP` into
/// `key=value` fields. A field with no `=` is kept with an empty value
/// rather than rejected, since trailing/blank fields occur in practice.
pub fn parse_records(body: &[u8]) -> Vec<Record> {
    body.split(|&b| b == BSEP)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let fields = chunk
                .split(|&b| b == FSEP)
                .filter(|f| !f.is_empty())
                .map(|field| {
                    let s = String::from_utf8_lossy(field);
                    match s.find('=') {
                        Some(idx) => (s[..idx].to_string(), s[idx + 1..].to_string()),
                        None => (s.into_owned(), String::new()),
                    }
                })
                .collect();
            Record { fields }
        })
        .collect()
}

/// Serializes records back to the `BSEP`/`FSEP` wire form (used when a
/// caller composes a record payload, e.g. `ROOM_BOUNCE_REASON` style
/// follow-up frames that share this grammar).
pub fn encode_records(records: &[Record]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(BSEP);
        }
        for (j, (k, v)) in record.fields.iter().enumerate() {
            if j > 0 {
                out.push(FSEP);
            }
            out.extend_from_slice(k.as_bytes());
            out.push(b'=');
            out.extend_from_slice(v.as_bytes());
        }
    }
    out
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Record { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_record() {
        let body = b"uid=7\nnickname=bob\nadmin=1";
        let records = parse_records(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("uid"), Some("7"));
        assert_eq!(records[0].get("nickname"), Some("bob"));
        assert_eq!(records[0].get("admin"), Some("1"));
    }

    #[test]
    fn parses_multiple_bsep_separated_records() {
        let mut body = b"uid=1\nnickname=a".to_vec();
        body.push(BSEP);
        body.extend_from_slice(b"uid=2\nnickname=b");
        let records = parse_records(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("uid"), Some("1"));
        assert_eq!(records[1].get("uid"), Some("2"));
    }

    #[test]
    fn missing_field_returns_none() {
        let records = parse_records(b"uid=1");
        assert_eq!(records[0].get("nickname"), None);
    }

    #[test]
    fn empty_body_yields_no_records() {
        assert!(parse_records(b"").is_empty());
    }

    #[test]
    fn roomlist_record_shape() {
        let records = parse_records(b"id=42\nname=Lounge\ncount=9\nl=1\nowner=bob");
        assert_eq!(records[0].get("l"), Some("1"));
        assert_eq!(records[0].get("owner"), Some("bob"));
    }

    #[test]
    fn round_trips_through_encode() {
        let records = parse_records(b"uid=1\nnickname=a");
        let encoded = encode_records(&records);
        let reparsed = parse_records(&encoded);
        assert_eq!(records, reparsed);
    }

    #[test]
    fn trailing_empty_fields_are_skipped() {
        let records = parse_records(b"uid=1\nnickname=a\n\n");
        assert_eq!(records[0].fields().len(), 2);
    }
}
