//! Email address formatting and address-list splitting (RFC 5322 §3.4).

/// A sender or recipient as a display name plus a bare address.
///
/// # Examples
/// - `display_name = "Ana Ruiz"`, `address = "ana@example.com"` → `"Ana Ruiz <ana@example.com>"`
/// - `display_name = ""`, `address = "ana@example.com"` → `"ana@example.com"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`), possibly empty.
    pub address: String,
}

impl EmailAddress {
    /// Build an address from optional name and address parts, trimming both.
    pub fn new(display_name: Option<&str>, address: Option<&str>) -> Self {
        Self {
            display_name: display_name.map(str::trim).unwrap_or_default().to_string(),
            address: address.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    /// `true` when both the name and the address are empty.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.address.is_empty()
    }

    /// Format for output: `"Name <address>"`, or whichever half is present.
    ///
    /// A display name identical to the address is not repeated.
    pub fn display(&self) -> String {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (true, _) => self.address.clone(),
            (false, true) => self.display_name.clone(),
            (false, false) if self.display_name == self.address => self.address.clone(),
            (false, false) => format!("{} <{}>", self.display_name, self.address),
        }
    }
}

/// Split a header address list on top-level commas.
///
/// Commas inside double quotes or angle brackets do not split. Each piece is
/// returned verbatim apart from surrounding whitespace; empty pieces are
/// dropped.
///
/// `"\"Last, First\" <a@b.com>, other@c.com"` → `["\"Last, First\" <a@b.com>", "other@c.com"]`
pub fn split_address_list(raw: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;

    for ch in raw.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                push_piece(&mut pieces, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    push_piece(&mut pieces, &current);

    pieces
}

/// Split a display list (Outlook's `Display To` / `Display Cc`) on `delimiter`.
pub fn split_display_list(raw: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        let mut single = Vec::new();
        push_piece(&mut single, raw);
        return single;
    }
    let mut pieces = Vec::new();
    for part in raw.split(delimiter) {
        push_piece(&mut pieces, part);
    }
    pieces
}

fn push_piece(pieces: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}
