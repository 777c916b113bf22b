//! Engine for `.eml` files (RFC 5322 messages).
//!
//! The file is parsed once with `mail-parser` when the engine is opened;
//! every field is then served from the extracted values.

use std::path::Path;

use mail_parser::{Addr, Address, MessageParser, MimeHeaders, PartType};
use tracing::debug;

use crate::engine::MessageSource;
use crate::error::{MailError, Result};
use crate::model::address::EmailAddress;
use crate::model::attachment::AttachmentEntry;
use crate::parser::header::{self, TransportHeaders};

/// Extracted view of one EML file.
#[derive(Debug, Clone)]
pub struct EmlEngine {
    sender: Option<String>,
    recipients: Vec<String>,
    cc: Vec<String>,
    subject: Option<String>,
    date: Option<String>,
    body: Option<String>,
    attachments: Vec<AttachmentEntry>,
}

impl EmlEngine {
    /// Read and parse an `.eml` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| MailError::io(path, e))?;
        Self::from_bytes(path, &data)
    }

    /// Parse an in-memory message. `path` is only used in log messages.
    ///
    /// Input without a header block yields empty fields and the whole text
    /// as the body.
    pub fn from_bytes(path: impl AsRef<Path>, raw: &[u8]) -> Result<Self> {
        let path = path.as_ref();
        let message = match MessageParser::default().parse(raw) {
            Some(message) if !message.headers().is_empty() => message,
            _ => {
                debug!(
                    path = %path.display(),
                    bytes = raw.len(),
                    "No header block, keeping text as body"
                );
                return Ok(Self::headerless(raw));
            }
        };

        let sender = Some(format_addresses(message.from()).join(", ")).filter(|s| !s.is_empty());
        let recipients = format_addresses(message.to());
        let cc = format_addresses(message.cc());
        let subject = message.subject().map(String::from);

        let date = message
            .date()
            .and_then(|d| {
                chrono::NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into())?
                    .and_hms_opt(d.hour.into(), d.minute.into(), d.second.into())
            })
            .or_else(|| raw_date_header(raw).and_then(|d| header::parse_date(&d)))
            .map(|dt| header::format_short_date(&dt));

        // mail-parser already sorts parts into body and attachment lists; a
        // body list without text/plain parts points at the HTML ones.
        let bodies: Vec<String> = message
            .text_body
            .iter()
            .filter_map(|&id| message.parts.get(id))
            .filter_map(|part| match &part.body {
                PartType::Text(text) => Some(text.to_string()),
                PartType::Html(html) => Some(html_to_text(html)),
                _ => None,
            })
            .collect();
        let body = (!bodies.is_empty()).then(|| bodies.join("\n"));

        let attachments: Vec<AttachmentEntry> = message
            .attachments
            .iter()
            .filter_map(|&id| message.parts.get(id))
            .map(|part| AttachmentEntry {
                long_filename: part.attachment_name().map(String::from),
                short_filename: None,
                data: part.contents().to_vec(),
            })
            .collect();

        debug!(
            path = %path.display(),
            parts = message.parts.len(),
            attachments = attachments.len(),
            "Parsed EML message"
        );

        Ok(Self {
            sender,
            recipients,
            cc,
            subject,
            date,
            body,
            attachments,
        })
    }

    fn headerless(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        Self {
            sender: None,
            recipients: Vec::new(),
            cc: Vec::new(),
            subject: None,
            date: None,
            body: (!text.trim().is_empty()).then(|| text.into_owned()),
            attachments: Vec::new(),
        }
    }
}

impl MessageSource for EmlEngine {
    fn sender(&mut self) -> Result<Option<String>> {
        Ok(self.sender.clone())
    }

    fn recipients(&mut self) -> Result<Vec<String>> {
        Ok(self.recipients.clone())
    }

    fn cc(&mut self) -> Result<Vec<String>> {
        Ok(self.cc.clone())
    }

    fn subject(&mut self) -> Result<Option<String>> {
        Ok(self.subject.clone())
    }

    fn date(&mut self) -> Result<Option<String>> {
        Ok(self.date.clone())
    }

    fn body(&mut self) -> Result<Option<String>> {
        Ok(self.body.clone())
    }

    fn attachments(&mut self) -> Result<&[AttachmentEntry]> {
        Ok(&self.attachments)
    }
}

/// Format every address of a header, flattening groups, dropping empty ones.
fn format_addresses(address: Option<&Address<'_>>) -> Vec<String> {
    let Some(address) = address else {
        return Vec::new();
    };
    let addrs: Vec<&Addr<'_>> = match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    };
    addrs
        .into_iter()
        .map(|a| EmailAddress::new(a.name.as_deref(), a.address.as_deref()))
        .filter(|a| !a.is_empty())
        .map(|a| a.display())
        .collect()
}

/// The raw `Date:` header, for dates `mail-parser` could not interpret.
fn raw_date_header(raw: &[u8]) -> Option<String> {
    let end = find_header_end(raw).unwrap_or(raw.len());
    let text = String::from_utf8_lossy(&raw[..end]);
    TransportHeaders::parse(&text)
        .ok()?
        .get("date")
        .map(String::from)
}

/// Find the byte offset where headers end (position of the first blank line).
fn find_header_end(data: &[u8]) -> Option<usize> {
    (0..data.len()).find(|&i| {
        data[i..].starts_with(b"\n\n") || data[i..].starts_with(b"\r\n\r\n")
    })
}

/// Convert an HTML body to plain text: block tags become line breaks, other
/// tags are stripped, common entities decoded, blank runs collapsed.
fn html_to_text(html: &str) -> String {
    let mut text = remove_tag_block(html, "script");
    text = remove_tag_block(&text, "style");

    for tag in ["<br>", "<br/>", "<br />", "<BR>"] {
        text = text.replace(tag, "\n");
    }
    for tag in ["p", "div", "tr", "li", "h1", "h2", "h3"] {
        for form in [format!("</{tag}>"), format!("</{}>", tag.to_uppercase())] {
            text = text.replace(&form, "\n");
        }
    }

    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let mut cleaned = String::with_capacity(decoded.len());
    let mut prev_blank = false;
    for line in decoded.lines().map(str::trim) {
        if line.is_empty() {
            if !prev_blank {
                cleaned.push('\n');
            }
            prev_blank = true;
        } else {
            cleaned.push_str(line);
            cleaned.push('\n');
            prev_blank = false;
        }
    }
    cleaned.trim().to_string()
}

/// Remove an entire tag block (e.g. `<script>…</script>`), case-insensitively.
fn remove_tag_block(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;

    loop {
        let lower = remaining.to_ascii_lowercase();
        let Some(start) = lower.find(&open) else {
            break;
        };
        result.push_str(&remaining[..start]);
        match lower[start..].find(&close) {
            Some(end) => remaining = &remaining[start + end + close.len()..],
            None => {
                remaining = "";
                break;
            }
        }
    }
    result.push_str(remaining);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"From: Ana Ruiz <ana@example.com>\r\n\
To: bob@example.com, \"Stone, Carl\" <carl@example.com>\r\n\
Cc: dana@example.com\r\n\
Subject: Budget review\r\n\
Date: Tue, 09 May 2017 14:05:00 +0000\r\n\
\r\n\
Numbers attached.\r\n";

    const MULTIPART: &[u8] = b"From: ana@example.com\r\n\
Subject: Files\r\n\
Date: Mon, 3 Jun 2019 08:15:00 +0200\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XX\"\r\n\
\r\n\
--XX\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
First part\r\n\
--XX\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQ=\r\n\
--XX\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
iVBORw0K\r\n\
--XX--\r\n";

    #[test]
    fn test_simple_fields() {
        let mut eml = EmlEngine::from_bytes("simple.eml", SIMPLE).unwrap();
        let record = eml.normalize().unwrap();
        assert_eq!(record.sender, "Ana Ruiz <ana@example.com>");
        assert_eq!(
            record.recipients,
            vec!["bob@example.com", "Stone, Carl <carl@example.com>"]
        );
        assert_eq!(record.cc, vec!["dana@example.com"]);
        assert_eq!(record.subject, "Budget review");
        assert_eq!(record.date, "9-5-2017, 14:5");
        assert!(record.body.starts_with("Numbers attached."));
        assert!(record.attachments.is_empty());
    }

    #[test]
    fn test_multipart_body_and_attachments() {
        let mut eml = EmlEngine::from_bytes("files.eml", MULTIPART).unwrap();
        let record = eml.normalize().unwrap();
        assert!(record.body.contains("First part"));
        assert_eq!(record.attachments, vec!["report.pdf", "attachment_1"]);
        assert_eq!(record.date, "3-6-2019, 8:15");
        assert!(record.recipients.is_empty());
        assert_eq!(eml.attachments().unwrap()[0].data, b"%PDF-1.4");
    }

    #[test]
    fn test_missing_headers_are_empty() {
        let mut eml = EmlEngine::from_bytes("bare.eml", b"X-Note: nothing\r\n\r\nhi\r\n").unwrap();
        let record = eml.normalize().unwrap();
        assert_eq!(record.sender, "");
        assert_eq!(record.subject, "");
        assert_eq!(record.date, "");
        assert!(record.recipients.is_empty());
        assert!(record.cc.is_empty());
    }

    #[test]
    fn test_empty_input_is_empty_record() {
        let mut eml = EmlEngine::from_bytes("empty.eml", b"").unwrap();
        let record = eml.normalize().unwrap();
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"from":"","to":[],"cc":[],"subject":"","date":"","attachments":[],"body":""}"#
        );
    }

    #[test]
    fn test_headerless_text_becomes_body() {
        let text = b"Meeting moved to Thursday.\nBring the slides.\n";
        let mut eml = EmlEngine::from_bytes("note.eml", text).unwrap();
        let record = eml.normalize().unwrap();
        assert_eq!(record.sender, "");
        assert_eq!(record.subject, "");
        assert!(record.recipients.is_empty());
        assert!(record.attachments.is_empty());
        assert!(record.body.contains("Meeting moved to Thursday."));
        assert!(record.body.contains("Bring the slides."));
    }

    #[test]
    fn test_every_sender_address_kept() {
        let raw = b"From: Ana Ruiz <ana@example.com>, bob@example.com\r\n\
Subject: Joint note\r\n\
\r\n\
Signed by both.\r\n";
        let mut eml = EmlEngine::from_bytes("joint.eml", raw).unwrap();
        let record = eml.normalize().unwrap();
        assert_eq!(record.sender, "Ana Ruiz <ana@example.com>, bob@example.com");
    }

    #[test]
    fn test_find_header_end_crlf() {
        let data = b"From: a@b.com\r\nSubject: Hi\r\n\r\nBody\r\n";
        assert_eq!(find_header_end(data), Some(26));
    }

    #[test]
    fn test_html_to_text() {
        let html = "<p>Hello <b>world</b></p><script>x()</script><p>Tom &amp; Jerry</p>";
        assert_eq!(html_to_text(html), "Hello world\nTom & Jerry");
    }
}
