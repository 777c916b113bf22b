//! Catalog of MAPI property tags found in `.msg` files.
//!
//! Labels are informational (diagnostics and the `streams` command); no
//! extraction logic branches on them.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix of every property stream name.
pub const PROPERTY_PREFIX: &str = "__substg1.0_";

/// A 4-hex-digit property tag and its human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyTag {
    pub tag: &'static str,
    pub label: &'static str,
}

pub const SUBJECT: &str = "0037";
pub const TRANSPORT_HEADERS: &str = "007D";
pub const SENDER_NAME: &str = "0C1A";
pub const SENDER_EMAIL: &str = "0C1F";
pub const DISPLAY_CC: &str = "0E03";
pub const DISPLAY_TO: &str = "0E04";
pub const BODY: &str = "1000";
pub const ATTACH_DATA: &str = "3701";
pub const ATTACH_SHORT_FILENAME: &str = "3704";
pub const ATTACH_LONG_FILENAME: &str = "3707";

/// Source: http://www.fileformat.info/format/outlookmsg/index.htm
#[rustfmt::skip]
const CATALOG: &[PropertyTag] = &[
    PropertyTag { tag: "001A", label: "Message class" },
    PropertyTag { tag: "0037", label: "Subject" },
    PropertyTag { tag: "003D", label: "Subject prefix" },
    PropertyTag { tag: "0040", label: "Received by name" },
    PropertyTag { tag: "0042", label: "Sent repr name" },
    PropertyTag { tag: "0044", label: "Rcvd repr name" },
    PropertyTag { tag: "004D", label: "Org author name" },
    PropertyTag { tag: "0050", label: "Reply rcipnt names" },
    PropertyTag { tag: "005A", label: "Org sender name" },
    PropertyTag { tag: "0064", label: "Sent repr adrtype" },
    PropertyTag { tag: "0065", label: "Sent repr email" },
    PropertyTag { tag: "0070", label: "Topic" },
    PropertyTag { tag: "0075", label: "Rcvd by adrtype" },
    PropertyTag { tag: "0076", label: "Rcvd by email" },
    PropertyTag { tag: "0077", label: "Repr adrtype" },
    PropertyTag { tag: "0078", label: "Repr email" },
    PropertyTag { tag: "007D", label: "Message header" },
    PropertyTag { tag: "0C1A", label: "Sender name" },
    PropertyTag { tag: "0C1E", label: "Sender adr type" },
    PropertyTag { tag: "0C1F", label: "Sender email" },
    PropertyTag { tag: "0E02", label: "Display BCC" },
    PropertyTag { tag: "0E03", label: "Display CC" },
    PropertyTag { tag: "0E04", label: "Display To" },
    PropertyTag { tag: "0E1D", label: "Subject (normalized)" },
    PropertyTag { tag: "0E28", label: "Recvd account1 (uncertain)" },
    PropertyTag { tag: "0E29", label: "Recvd account2 (uncertain)" },
    PropertyTag { tag: "1000", label: "Message body" },
    PropertyTag { tag: "1008", label: "RTF sync body tag" },
    PropertyTag { tag: "1035", label: "Message ID (uncertain)" },
    PropertyTag { tag: "1046", label: "Sender email (uncertain)" },
    PropertyTag { tag: "3001", label: "Display name" },
    PropertyTag { tag: "3002", label: "Address type" },
    PropertyTag { tag: "3003", label: "Email address" },
    PropertyTag { tag: "39FE", label: "7-bit email (uncertain)" },
    PropertyTag { tag: "39FF", label: "7-bit display name" },
    // Attachments (37xx)
    PropertyTag { tag: "3701", label: "Attachment data" },
    PropertyTag { tag: "3703", label: "Attachment extension" },
    PropertyTag { tag: "3704", label: "Attachment short filename" },
    PropertyTag { tag: "3707", label: "Attachment long filename" },
    PropertyTag { tag: "370E", label: "Attachment mime tag" },
    PropertyTag { tag: "3712", label: "Attachment ID (uncertain)" },
    // Address book (3Axx)
    PropertyTag { tag: "3A00", label: "Account" },
    PropertyTag { tag: "3A02", label: "Callback phone no" },
    PropertyTag { tag: "3A05", label: "Generation" },
    PropertyTag { tag: "3A06", label: "Given name" },
    PropertyTag { tag: "3A08", label: "Business phone" },
    PropertyTag { tag: "3A09", label: "Home phone" },
    PropertyTag { tag: "3A0A", label: "Initials" },
    PropertyTag { tag: "3A0B", label: "Keyword" },
    PropertyTag { tag: "3A0C", label: "Language" },
    PropertyTag { tag: "3A0D", label: "Location" },
    PropertyTag { tag: "3A11", label: "Surname" },
    PropertyTag { tag: "3A15", label: "Postal address" },
    PropertyTag { tag: "3A16", label: "Company name" },
    PropertyTag { tag: "3A17", label: "Title" },
    PropertyTag { tag: "3A18", label: "Department" },
    PropertyTag { tag: "3A19", label: "Office location" },
    PropertyTag { tag: "3A1A", label: "Primary phone" },
    PropertyTag { tag: "3A1B", label: "Business phone 2" },
    PropertyTag { tag: "3A1C", label: "Mobile phone" },
    PropertyTag { tag: "3A1D", label: "Radio phone no" },
    PropertyTag { tag: "3A1E", label: "Car phone no" },
    PropertyTag { tag: "3A1F", label: "Other phone" },
    PropertyTag { tag: "3A20", label: "Transmit dispname" },
    PropertyTag { tag: "3A21", label: "Pager" },
    PropertyTag { tag: "3A22", label: "User certificate" },
    PropertyTag { tag: "3A23", label: "Primary Fax" },
    PropertyTag { tag: "3A24", label: "Business Fax" },
    PropertyTag { tag: "3A25", label: "Home Fax" },
    PropertyTag { tag: "3A26", label: "Country" },
    PropertyTag { tag: "3A27", label: "Locality" },
    PropertyTag { tag: "3A28", label: "State/Province" },
    PropertyTag { tag: "3A29", label: "Street address" },
    PropertyTag { tag: "3A2A", label: "Postal Code" },
    PropertyTag { tag: "3A2B", label: "Post Office Box" },
    PropertyTag { tag: "3A2C", label: "Telex" },
    PropertyTag { tag: "3A2D", label: "ISDN" },
    PropertyTag { tag: "3A2E", label: "Assistant phone" },
    PropertyTag { tag: "3A2F", label: "Home phone 2" },
    PropertyTag { tag: "3A30", label: "Assistant" },
    PropertyTag { tag: "3A44", label: "Middle name" },
    PropertyTag { tag: "3A45", label: "Dispname prefix" },
    PropertyTag { tag: "3A46", label: "Profession" },
    PropertyTag { tag: "3A48", label: "Spouse name" },
    PropertyTag { tag: "3A4B", label: "TTYTTD radio phone" },
    PropertyTag { tag: "3A4C", label: "FTP site" },
    PropertyTag { tag: "3A4E", label: "Manager name" },
    PropertyTag { tag: "3A4F", label: "Nickname" },
    PropertyTag { tag: "3A51", label: "Business homepage" },
    PropertyTag { tag: "3A57", label: "Company main phone" },
    PropertyTag { tag: "3A58", label: "Childrens names" },
    PropertyTag { tag: "3A59", label: "Home City" },
    PropertyTag { tag: "3A5A", label: "Home Country" },
    PropertyTag { tag: "3A5B", label: "Home Postal Code" },
    PropertyTag { tag: "3A5C", label: "Home State/Provnce" },
    PropertyTag { tag: "3A5D", label: "Home Street" },
    PropertyTag { tag: "3A5F", label: "Other adr City" },
    PropertyTag { tag: "3A60", label: "Other adr Country" },
    PropertyTag { tag: "3A61", label: "Other adr PostCode" },
    PropertyTag { tag: "3A62", label: "Other adr Province" },
    PropertyTag { tag: "3A63", label: "Other adr Street" },
    PropertyTag { tag: "3A64", label: "Other adr PO box" },
    PropertyTag { tag: "3FF7", label: "Server (uncertain)" },
    PropertyTag { tag: "3FF8", label: "Creator1 (uncertain)" },
    PropertyTag { tag: "3FFA", label: "Creator2 (uncertain)" },
    PropertyTag { tag: "3FFC", label: "To email (uncertain)" },
    PropertyTag { tag: "403D", label: "To adrtype (uncertain)" },
    PropertyTag { tag: "403E", label: "To email (uncertain)" },
    PropertyTag { tag: "5FF6", label: "To (uncertain)" },
];

static LABELS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn labels() -> &'static HashMap<&'static str, &'static str> {
    LABELS.get_or_init(|| CATALOG.iter().map(|p| (p.tag, p.label)).collect())
}

/// Label for a 4-hex-digit tag. Case-insensitive.
pub fn label(tag: &str) -> Option<&'static str> {
    labels().get(tag.to_ascii_uppercase().as_str()).copied()
}

/// Value type encoded in the last four hex digits of a stream name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// `001E`: 8-bit string.
    String8,
    /// `001F`: UTF-16LE string.
    Unicode,
    /// `0102`: binary blob.
    Binary,
    /// `000D`: embedded object (storage).
    Object,
    /// Any other 4-hex-digit type code.
    Other(u16),
}

impl PropertyType {
    pub fn from_code(code: &str) -> Option<Self> {
        let value = u16::from_str_radix(code, 16).ok()?;
        Some(match value {
            0x001E => Self::String8,
            0x001F => Self::Unicode,
            0x0102 => Self::Binary,
            0x000D => Self::Object,
            other => Self::Other(other),
        })
    }

    pub fn name(self) -> String {
        match self {
            Self::String8 => "string8".into(),
            Self::Unicode => "unicode".into(),
            Self::Binary => "binary".into(),
            Self::Object => "object".into(),
            Self::Other(code) => format!("0x{code:04X}"),
        }
    }
}

/// A decoded property stream name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub tag: String,
    pub kind: PropertyType,
    pub label: Option<&'static str>,
}

/// Decode a stream name like `__substg1.0_0037001F`.
///
/// Returns `None` for names without the property prefix or with non-hex
/// tag/type digits.
pub fn describe(stream_name: &str) -> Option<StreamInfo> {
    let code = stream_name.strip_prefix(PROPERTY_PREFIX)?;
    if code.len() != 8 || !code.is_ascii() {
        return None;
    }
    let (tag, kind) = code.split_at(4);
    u16::from_str_radix(tag, 16).ok()?;
    let tag = tag.to_ascii_uppercase();
    Some(StreamInfo {
        label: label(&tag),
        kind: PropertyType::from_code(kind)?,
        tag,
    })
}
