//! HTML <-> service "pseudo-HTML" translation used for IM bodies.
//!
//! The service understands a handful of `<pfont ...>`-prefixed tags
//! instead of real HTML. Outbound conversion swaps standard tags for
//! their pseudo equivalents (and swaps the R/B bytes of color codes);
//! inbound conversion is the mirror image.

/// Converts real HTML to the wire's pseudo-HTML, wrapping untagged text in
/// the service's mandatory default formatting.
pub fn to_pseudo_html(html: &str) -> String {
    let decoded = decode_entities(html);
    let converted = rewrite_tags(&decoded, Direction::ToPseudo);
    if !converted.contains("<pfont") {
        format!(r#"<pfont color="#0"><pfont-size="10">{}</pfont></pfont>"#, converted)
    } else {
        converted
    }
}

/// Converts pseudo-HTML received from the wire back into real HTML.
/// `<body>`/`</body>` wrappers are stripped with no pseudo equivalent.
pub fn from_pseudo_html(pseudo: &str) -> String {
    let stripped = strip_body_tags(pseudo);
    let (leader, rest) = extract_offline_leader(&stripped);
    let converted = rewrite_tags(&rest, Direction::FromPseudo);
    match leader {
        Some(prefix) => format!("{}{}", prefix, converted),
        None => converted,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToPseudo,
    FromPseudo,
}

fn strip_body_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    loop {
        let lower_rest = rest.to_ascii_lowercase();
        if let Some(start) = lower_rest.find("<body") {
            let Some(tag_end) = rest[start..].find('>') else {
                out.push_str(&rest[..start]);
                rest = "";
                break;
            };
            out.push_str(&rest[..start]);
            rest = &rest[start + tag_end + 1..];
        } else if let Some(start) = lower_rest.find("</body>") {
            out.push_str(&rest[..start]);
            rest = &rest[start + "</body>".len()..];
        } else {
            out.push_str(rest);
            break;
        }
    }
    out
}

/// Recognizes the `<<(date time tz)>>` offline-message leader and returns
/// it rewritten as `[Sent On: date time tz]` plus the remaining body.
fn extract_offline_leader(s: &str) -> (Option<String>, String) {
    if let Some(rest) = s.strip_prefix("<<(") {
        if let Some(end) = rest.find(")>>") {
            let inner = &rest[..end];
            let body = &rest[end + 3..];
            return (Some(format!("[Sent On: {}]", inner)), body.to_string());
        }
    }
    (None, s.to_string())
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&").replace("&quot;", "\"")
}

fn rewrite_tags(s: &str, direction: Direction) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            out.push(bytes[i] as char);
            i += 1;
            continue;
        }
        let Some(close_rel) = s[i..].find('>') else {
            // Bare `<` with no following `p` or `/` is escaped on the
            // outbound path; no matching `>` means there is no tag at all.
            if direction == Direction::ToPseudo {
                out.push_str("&lt;");
            } else {
                out.push('<');
            }
            i += 1;
            continue;
        };
        let tag = &s[i + 1..i + close_rel];
        out.push_str(&rewrite_one_tag(tag, direction));
        i += close_rel + 1;
    }
    out
}

fn rewrite_one_tag(tag: &str, direction: Direction) -> String {
    let (closing, body) = match tag.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, tag),
    };

    match direction {
        Direction::ToPseudo => {
            if let Some(color) = body.strip_prefix("font color=\"#").and_then(|r| r.strip_suffix('"')) {
                return format!("<pfont color=\"#{}\">", swap_rb(color));
            }
            if let Some(size) = body.strip_prefix("font size=\"").and_then(|r| r.strip_suffix('"')) {
                return format!("<pfont-size=\"{}\">", map_size_outbound(size));
            }
            if body == "font" {
                return if closing { "</pfont>".to_string() } else { "<pfont>".to_string() };
            }
            // Any other single tag (b, i, u, br, ...) is generically
            // prefixed with `p`, not special-cased.
            if closing {
                format!("</p{}>", body)
            } else {
                format!("<p{}>", body)
            }
        }
        Direction::FromPseudo => {
            if let Some(color) = body.strip_prefix("pfont color=\"#").and_then(|r| r.strip_suffix('"')) {
                return format!("<font color=\"#{}\">", swap_rb(color));
            }
            if let Some(size) = body.strip_prefix("pfont-size=\"").and_then(|r| r.strip_suffix('"')) {
                return format!("<font size=\"{}\">", map_size_inbound(size));
            }
            if body == "pfont" {
                return if closing { "</font>".to_string() } else { "<font>".to_string() };
            }
            if let Some(rest) = body.strip_prefix('p') {
                if closing {
                    format!("</{}>", rest)
                } else {
                    format!("<{}>", rest)
                }
            } else if closing {
                format!("</{}>", body)
            } else {
                format!("<{}>", body)
            }
        }
    }
}

/// `#RRGGBB` <-> `#NBGR` where N swaps the R and B bytes; round-trips
/// because the swap is its own inverse.
fn swap_rb(hex: &str) -> String {
    if hex.len() != 6 {
        return hex.to_string();
    }
    let bytes = hex.as_bytes();
    let mut swapped = String::with_capacity(6);
    swapped.push(bytes[4] as char);
    swapped.push(bytes[5] as char);
    swapped.push(bytes[2] as char);
    swapped.push(bytes[3] as char);
    swapped.push(bytes[0] as char);
    swapped.push(bytes[1] as char);
    swapped
}

fn map_size_outbound(size: &str) -> &'static str {
    match size.parse::<u32>().unwrap_or(0) {
        0..=2 => "8",
        3 => "10",
        _ => "12",
    }
}

fn map_size_inbound(pseudo_size: &str) -> &'static str {
    match pseudo_size.parse::<u32>().unwrap_or(0) {
        0..=8 => "2",
        9..=11 => "3",
        _ => "4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_untagged_outbound_text() {
        let out = to_pseudo_html("hello");
        assert_eq!(out, r#"<pfont color="#0"><pfont-size="10">hello</pfont></pfont>"#);
    }

    #[test]
    fn does_not_rewrap_when_pfont_present() {
        let out = to_pseudo_html(r#"<font color="#FF0000">hi</font>"#);
        assert!(out.starts_with("<pfont color=\"#0000FF\">"));
        assert!(!out.contains("<pfont color=\"#0\">"));
    }

    #[test]
    fn font_color_swaps_r_and_b() {
        let out = to_pseudo_html(r#"<font color="#FF00AA">x</font>"#);
        assert!(out.contains(r#"<pfont color="#AA00FF">"#));
    }

    #[test]
    fn font_size_mapping_outbound() {
        assert_eq!(map_size_outbound("1"), "8");
        assert_eq!(map_size_outbound("2"), "8");
        assert_eq!(map_size_outbound("3"), "10");
        assert_eq!(map_size_outbound("4"), "12");
        assert_eq!(map_size_outbound("9"), "12");
    }

    #[test]
    fn bare_angle_bracket_is_escaped_outbound() {
        let out = to_pseudo_html("1 < 2");
        assert!(out.contains("1 &lt; 2"));
    }

    #[test]
    fn generic_single_tag_is_prefixed() {
        let out = to_pseudo_html("<b>bold</b>");
        assert!(out.contains("<pb>bold</pb>"));
    }

    #[test]
    fn body_tags_are_stripped_inbound() {
        let out = from_pseudo_html("<body bgcolor=\"#fff\">hello</body>");
        assert_eq!(out, "hello");
    }

    #[test]
    fn inbound_pfont_color_round_trips() {
        let pseudo = r#"<pfont color="#AA00FF">x</pfont>"#;
        let html = from_pseudo_html(pseudo);
        assert!(html.contains(r#"<font color="#FF00AA">"#));
    }

    #[test]
    fn offline_leader_is_converted() {
        let out = from_pseudo_html("<<(01/02/03 10:00 EST)>>hello");
        assert_eq!(out, "[Sent On: 01/02/03 10:00 EST]hello");
    }

    #[test]
    fn round_trip_is_idempotent_for_basic_subset() {
        let original = r#"<font color="#112233">hi <b>there</b></font>"#;
        let pseudo = to_pseudo_html(original);
        let back = from_pseudo_html(&pseudo);
        // Color is normalized via swap, not reproduced verbatim, so compare
        // the swap-normalized form rather than the raw literal.
        let pseudo2 = to_pseudo_html(&back);
        assert_eq!(pseudo, pseudo2);
    }
}
