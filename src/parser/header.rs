//! RFC 5322 header blocks: unfolding, case-insensitive lookup and date parsing.
//!
//! Used for the transport-header blob embedded in MSG files (tag `007D`) and
//! as the lenient date fallback for EML.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use tracing::warn;

use crate::error::{MailError, Result};

/// First line Outlook writes in front of some stored transport headers.
const OUTLOOK_BANNER: &str = "Microsoft Mail Internet Headers";

/// A parsed header block: `(lowercase_name, value)` pairs in block order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeaders {
    fields: Vec<(String, String)>,
}

impl TransportHeaders {
    /// Parse a header block.
    ///
    /// Continuation lines are joined to the previous field. Parsing stops at
    /// the first blank line after at least one field. Fails when the block
    /// holds no field at all, or when it starts with a line that is neither a
    /// field nor something a field could continue.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if fields.is_empty() {
                    continue;
                }
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match fields.last_mut() {
                    Some(last) => {
                        if !last.1.is_empty() {
                            last.1.push(' ');
                        }
                        last.1.push_str(line.trim());
                    }
                    None => {
                        return Err(MailError::MalformedHeader(
                            "continuation line before any field".into(),
                        ))
                    }
                }
                continue;
            }

            match split_field(line) {
                Some((name, value)) => fields.push((name, value)),
                None if fields.is_empty() && line.starts_with(OUTLOOK_BANNER) => {}
                None if fields.is_empty() => {
                    return Err(MailError::MalformedHeader(format!(
                        "first line is not a header field: {:?}",
                        truncate(line, 40)
                    )))
                }
                // Stray lines after valid fields are skipped
                None => {}
            }
        }

        if fields.is_empty() {
            return Err(MailError::MalformedHeader("no header fields".into()));
        }

        Ok(Self { fields })
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields, duplicates included.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Split `Name: value`. The name must be non-empty printable ASCII without spaces.
fn split_field(line: &str) -> Option<(String, String)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':');
    if !valid {
        return None;
    }
    Some((name.to_lowercase(), line[colon + 1..].trim().to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Format calendar fields as `D-M-Y, H:M` without zero padding.
pub fn format_short_date(dt: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{}, {}:{}",
        dt.day(),
        dt.month(),
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}

/// Parse an email date string in various common formats.
///
/// Returns the wall-clock fields as written in the header; the zone offset
/// is not applied. Supports RFC 2822, ISO 8601 and many broken real-world
/// variants.
pub fn parse_date(date_str: &str) -> Option<NaiveDateTime> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    // Trailing comments such as "(UTC)" or "(Pacific Standard Time)"
    let no_comment = strip_trailing_comment(trimmed);
    let no_dow = strip_day_of_week(no_comment);
    let no_dow_normalized = normalize_imap_date(&no_dow);

    let zoned_formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
    ];
    let naive_formats = [
        "%d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for candidate in [&no_dow, &no_dow_normalized] {
        let replaced = replace_named_tz(candidate);
        for source in [candidate.as_str(), replaced.as_str()] {
            for fmt in &zoned_formats {
                if let Ok(dt) = DateTime::parse_from_str(source, fmt) {
                    return Some(dt.naive_local());
                }
            }
            for fmt in &naive_formats {
                if let Ok(ndt) = NaiveDateTime::parse_from_str(source, fmt) {
                    return Some(ndt);
                }
            }
        }
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Strip a trailing parenthesized comment: `"... +0000 (UTC)"` → `"... +0000"`.
fn strip_trailing_comment(s: &str) -> &str {
    if s.ends_with(')') {
        if let Some(open) = s.rfind('(') {
            return s[..open].trim_end();
        }
    }
    s
}

/// Normalize IMAP-style dates: `"16-JUL-2025 03:01:03"` → `"16 Jul 2025 03:01:03"`.
fn normalize_imap_date(s: &str) -> String {
    if !s.contains('-') {
        return s.to_string();
    }

    let title_months = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    for month in title_months {
        for pattern in [
            format!("-{}-", month.to_uppercase()),
            format!("-{}-", month.to_lowercase()),
            format!("-{month}-"),
        ] {
            if s.contains(&pattern) {
                return s.replacen(&pattern, &format!(" {month} "), 1);
            }
        }
    }

    s.to_string()
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in days {
        if let Some(rest) = s.strip_prefix(day) {
            if let Some(rest) = rest.strip_prefix(',').or_else(|| rest.strip_prefix(' ')) {
                return rest.trim().to_string();
            }
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("CEST", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("UT", "+0000"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    for (name, offset) in tzs {
        if let Some(head) = s.strip_suffix(name) {
            return format!("{head}{offset}");
        }
    }
    s.to_string()
}
