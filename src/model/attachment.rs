//! Attachment entries discovered inside a message.
//!
//! Content is kept as raw bytes; no transfer or container decoding is
//! applied beyond what the source format already did.

/// One attachment of a message.
///
/// Owned by the engine that discovered it and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentEntry {
    /// Long filename (MSG tag `3707`, or the MIME filename for EML).
    pub long_filename: Option<String>,

    /// 8.3 short filename (MSG tag `3704`). Always `None` for EML.
    pub short_filename: Option<String>,

    /// Raw attachment bytes (MSG tag `3701`). Empty when the data stream is absent.
    pub data: Vec<u8>,
}

impl AttachmentEntry {
    /// Name shown in the normalized record.
    ///
    /// Long filename first, then the short filename, then `attachment_{index}`.
    pub fn display_name(&self, index: usize) -> String {
        [&self.long_filename, &self.short_filename]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("attachment_{index}"))
    }
}

/// Display names for a list of attachments, in order.
pub fn display_names(entries: &[AttachmentEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| entry.display_name(idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(long: Option<&str>, short: Option<&str>) -> AttachmentEntry {
        AttachmentEntry {
            long_filename: long.map(String::from),
            short_filename: short.map(String::from),
            data: Vec::new(),
        }
    }

    #[test]
    fn test_long_filename_preferred() {
        let att = entry(Some("Quarterly Report.pdf"), Some("QUARTE~1.PDF"));
        assert_eq!(att.display_name(0), "Quarterly Report.pdf");
    }

    #[test]
    fn test_short_filename_fallback() {
        let att = entry(None, Some("QUARTE~1.PDF"));
        assert_eq!(att.display_name(0), "QUARTE~1.PDF");
    }

    #[test]
    fn test_blank_long_filename_falls_through() {
        let att = entry(Some("  "), Some("IMG.PNG"));
        assert_eq!(att.display_name(3), "IMG.PNG");
    }

    #[test]
    fn test_generated_name_when_both_missing() {
        let names = display_names(&[entry(Some("a.txt"), None), entry(None, None)]);
        assert_eq!(names, vec!["a.txt", "attachment_1"]);
    }
}
