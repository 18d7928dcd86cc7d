//! Message formatting.
//!
//! Turns a [`WireMessage`] into a [`RenderedLine`]: author defaulting,
//! timestamp resolution, and link detection. Everything here is a pure
//! function of its inputs. The only impure input, "now", is passed in by the
//! caller so the fallback branch stays deterministic under test.
//!
//! # Known accuracy gap
//!
//! A message whose timestamp is missing, zero, or not an integer is stamped
//! with the time it was formatted. History replayed after a room switch can
//! therefore show replay time instead of send time for corrupt records.

use std::{fmt, sync::LazyLock};

use chrono::{DateTime, TimeZone};
use dover_proto::{RawTimestamp, WireMessage};
use regex::Regex;

/// Epoch milliseconds.
pub type Timestamp = i64;

/// Author shown when a message carries none.
pub const DEFAULT_AUTHOR: &str = "Dover";

/// Links: `http`, `https`, `ftp` or `file` scheme followed by a run of URL
/// characters. The run ends at the last character in the class, so trailing
/// punctuation such as `!` or `.` is kept inside the link.
#[allow(clippy::expect_used, reason = "pattern is a literal")]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?|ftp|file)://[-A-Z0-9+&@#/%?=~_|!:,.;]+")
        .expect("URL pattern compiles")
});

/// One run of a rendered message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text, unmodified.
    Text(String),
    /// Detected link. Opens in a new context when activated.
    Link(String),
}

/// Display-ready message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Resolved author (never empty).
    pub author: String,
    /// Resolved send time.
    pub timestamp: Timestamp,
    /// Body split into text and links, in order.
    pub segments: Vec<Segment>,
}

impl RenderedLine {
    /// Body with link markup removed.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) | Segment::Link(text) => text.as_str(),
            })
            .collect()
    }

    /// Links in the body, in order of appearance.
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Link(url) => Some(url.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Timestamp as `M/D/YYYY, h:mm:ss AM` in the given zone.
    ///
    /// Out-of-range timestamps render as the raw millisecond value.
    pub fn time_label<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        DateTime::from_timestamp_millis(self.timestamp).map_or_else(
            || self.timestamp.to_string(),
            |utc| utc.with_timezone(tz).format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        )
    }

    /// HTML fragment for an append-only markup surface.
    ///
    /// Author and plain text are escaped once; links become anchors with
    /// `target="_blank"`.
    pub fn to_html<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut body = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => escape_into(&mut body, text),
                Segment::Link(url) => {
                    body.push_str("<a href=\"");
                    body.push_str(url);
                    body.push_str("\" target=\"_blank\">");
                    body.push_str(url);
                    body.push_str("</a>");
                },
            }
        }

        let mut author = String::new();
        escape_into(&mut author, &self.author);

        format!("<b>{author}@{}: </b><br/>{body}<br/>", self.time_label(tz))
    }
}

/// Format a raw message for display.
///
/// `now` is substituted when the timestamp is absent, zero, or does not
/// parse as an integer.
pub fn format_message(raw: &WireMessage, now: Timestamp) -> RenderedLine {
    let author = match raw.author.as_deref() {
        Some(author) if !author.is_empty() => author.to_string(),
        _ => DEFAULT_AUTHOR.to_string(),
    };

    RenderedLine {
        author,
        timestamp: resolve_timestamp(raw.timestamp.as_ref(), now),
        segments: linkify(&raw.text),
    }
}

/// Resolve a raw timestamp to epoch milliseconds, falling back to `now`.
pub fn resolve_timestamp(raw: Option<&RawTimestamp>, now: Timestamp) -> Timestamp {
    let parsed = match raw {
        Some(RawTimestamp::Integer(millis)) => Some(*millis),
        Some(RawTimestamp::Float(millis)) => millis.is_finite().then(|| millis.trunc() as i64),
        Some(RawTimestamp::Text(text)) => parse_leading_integer(text),
        None => None,
    };

    match parsed {
        Some(millis) if millis != 0 => millis,
        _ => now,
    }
}

/// Leading-integer parse: optional whitespace and sign, then the longest run
/// of ASCII digits. Trailing garbage is ignored (`"17abc"` is 17).
fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(rest.len());
    let magnitude: i64 = rest[..digits_end].parse().ok()?;

    Some(if negative { -magnitude } else { magnitude })
}

/// Split text into plain runs and links.
pub fn linkify(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in URL_PATTERN.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::Text(text[cursor..found.start()].to_string()));
        }
        segments.push(Segment::Link(found.as_str().to_string()));
        cursor = found.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Text(text[cursor..].to_string()));
    }

    segments
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const NOW: Timestamp = 1_760_000_000_000;

    fn raw(author: Option<&str>, timestamp: Option<RawTimestamp>, text: &str) -> WireMessage {
        WireMessage::new(author, timestamp, text)
    }

    #[test]
    fn missing_author_defaults() {
        assert_eq!(format_message(&raw(None, None, "x"), NOW).author, "Dover");
        assert_eq!(format_message(&raw(Some(""), None, "x"), NOW).author, "Dover");
        assert_eq!(format_message(&raw(Some("ana"), None, "x"), NOW).author, "ana");
    }

    #[test]
    fn unusable_timestamps_fall_back_to_now() {
        let cases = [
            None,
            Some(RawTimestamp::Integer(0)),
            Some(RawTimestamp::Text("0".into())),
            Some(RawTimestamp::Text("soon".into())),
            Some(RawTimestamp::Text(String::new())),
            Some(RawTimestamp::Float(f64::NAN)),
        ];

        for case in cases {
            assert_eq!(resolve_timestamp(case.as_ref(), NOW), NOW, "case {case:?}");
        }
    }

    #[test]
    fn leading_integer_semantics() {
        assert_eq!(parse_leading_integer("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_leading_integer("  42ms"), Some(42));
        assert_eq!(parse_leading_integer("1.5e3"), Some(1));
        assert_eq!(parse_leading_integer("-7"), Some(-7));
        assert_eq!(parse_leading_integer("x1"), None);
        assert_eq!(parse_leading_integer("99999999999999999999"), None);
    }

    #[test]
    fn float_timestamps_truncate() {
        let ts = RawTimestamp::Float(1_700_000_000_000.9);
        assert_eq!(resolve_timestamp(Some(&ts), NOW), 1_700_000_000_000);
    }

    #[test]
    fn link_keeps_trailing_bang() {
        let line = format_message(&raw(None, Some(RawTimestamp::Integer(0)), "see http://x.co/a!"), NOW);

        assert_eq!(line.segments, vec![
            Segment::Text("see ".into()),
            Segment::Link("http://x.co/a!".into())
        ]);
        assert_eq!(line.timestamp, NOW);
    }

    #[test]
    fn all_schemes_link_case_insensitively() {
        let segments = linkify("a HTTPS://A.B b ftp://f.c c file:///tmp/x d http://h.i");
        let links: Vec<_> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Link(url) => Some(url.as_str()),
                Segment::Text(_) => None,
            })
            .collect();

        assert_eq!(links, ["HTTPS://A.B", "ftp://f.c", "file:///tmp/x", "http://h.i"]);
    }

    #[test]
    fn non_url_text_is_untouched() {
        let text = "5 < 6 & \"quotes\" stay";
        assert_eq!(linkify(text), vec![Segment::Text(text.into())]);
        assert!(linkify("").is_empty());
    }

    #[test]
    fn scheme_must_start_at_word_boundary() {
        assert_eq!(linkify("xhttp://nope"), vec![Segment::Text("xhttp://nope".into())]);
    }

    #[test]
    fn html_wraps_links_in_anchors() {
        let line = RenderedLine {
            author: "a<b".into(),
            timestamp: 0,
            segments: linkify("go http://x.co/?q=1&r=2 <now>"),
        };

        insta::assert_snapshot!(line.to_html(&Utc), @r#"<b>a&lt;b@1/1/1970, 12:00:00 AM: </b><br/>go <a href="http://x.co/?q=1&r=2" target="_blank">http://x.co/?q=1&r=2</a> &lt;now&gt;<br/>"#);
    }

    #[test]
    fn time_label_is_en_us_shape() {
        let line = RenderedLine {
            author: "x".into(),
            timestamp: 1_700_000_000_000,
            segments: vec![],
        };
        assert_eq!(line.time_label(&Utc), "11/14/2023, 10:13:20 PM");
    }

    #[test]
    fn plain_text_concatenates_segments() {
        let line = format_message(&raw(None, None, "a http://b.c d"), NOW);
        assert_eq!(line.plain_text(), "a http://b.c d");
        assert_eq!(line.links().collect::<Vec<_>>(), ["http://b.c"]);
    }
}
