//! The normalized record emitted for every input file.

/// Format-independent view of one email message.
///
/// Every field is always present: absent data becomes an empty string or an
/// empty list, so the JSON form always carries the same seven keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedMessage {
    /// Sender, e.g. `"Ana Ruiz <ana@example.com>"`.
    #[serde(rename = "from")]
    pub sender: String,

    /// Primary recipients, in header order.
    #[serde(rename = "to")]
    pub recipients: Vec<String>,

    /// Carbon-copy recipients, in header order.
    pub cc: Vec<String>,

    pub subject: String,

    /// `D-M-Y, H:M` without zero padding (e.g. `9-5-2017, 14:5`), or empty.
    pub date: String,

    /// Attachment display names, in discovery order.
    pub attachments: Vec<String>,

    pub body: String,
}

impl NormalizedMessage {
    /// Serialize to a single-line JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to an indented JSON object.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_has_all_keys() {
        let json: serde_json::Value =
            serde_json::from_str(&NormalizedMessage::default().to_json().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["attachments", "body", "cc", "date", "from", "subject", "to"]
        );
        assert!(obj["to"].is_array());
        assert!(obj["cc"].is_array());
        assert!(obj["attachments"].is_array());
        assert_eq!(obj["from"], "");
        assert_eq!(obj["date"], "");
    }

    #[test]
    fn test_key_order_is_stable() {
        let msg = NormalizedMessage {
            sender: "a@example.com".into(),
            ..Default::default()
        };
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"from":"a@example.com","to":[],"cc":[],"subject":"","date":"","attachments":[],"body":""}"#
        );
    }
}
