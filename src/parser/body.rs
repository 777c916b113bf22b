//! Legacy transport-encoding cleanup for message bodies.
//!
//! Some MSG writers store the plain-text body still UTF-7 or
//! quoted-printable encoded. Decoding never loses text: on any failure the
//! raw body is returned unchanged.

use std::str;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::{debug, warn};

use crate::error::{MailError, Result};

/// Which body decoding to attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyDecoding {
    /// Keep the body as stored.
    None,
    /// Detect quoted-printable soft breaks or UTF-7 shift sequences.
    #[default]
    Auto,
    /// Always decode as UTF-7 (RFC 2152).
    Utf7,
    /// Always decode as quoted-printable (RFC 2045).
    QuotedPrintable,
}

/// UTF-7 base64 runs: standard alphabet, no padding, trailing bits tolerated.
const UTF7_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Normalize a body according to `mode`, keeping the raw text on failure.
pub fn normalize_body(raw: &str, mode: BodyDecoding) -> String {
    let attempt = match mode {
        BodyDecoding::None => return raw.to_string(),
        BodyDecoding::Utf7 => decode_utf7(raw),
        BodyDecoding::QuotedPrintable => decode_quoted_printable(raw),
        BodyDecoding::Auto if looks_quoted_printable(raw) => {
            debug!("Body looks quoted-printable");
            decode_quoted_printable(raw)
        }
        BodyDecoding::Auto if looks_utf7(raw) => {
            debug!("Body looks UTF-7 encoded");
            decode_utf7(raw)
        }
        BodyDecoding::Auto => return raw.to_string(),
    };

    match attempt {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Keeping raw body");
            raw.to_string()
        }
    }
}

/// Soft line breaks only appear in quoted-printable text.
fn looks_quoted_printable(s: &str) -> bool {
    s.contains("=\r\n") || s.contains("=\n")
}

/// At least one shift sequence, and every shift sequence decodes to
/// non-ASCII text. `+-` and a bare `+` are ignored.
fn looks_utf7(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut found = false;
    let mut ix = 0;

    while ix < bytes.len() {
        if bytes[ix] != b'+' {
            ix += 1;
            continue;
        }
        let run_start = ix + 1;
        let run_len = bytes[run_start..]
            .iter()
            .take_while(|&&c| is_base64_char(c))
            .count();
        if run_len > 0 {
            // "bob+tag-x" is an address, not a shift
            let after_word = ix > 0 && bytes[ix - 1].is_ascii_alphanumeric();
            if after_word || !plausible_shift(&bytes[run_start..run_start + run_len]) {
                return false;
            }
            found = true;
        }
        ix = run_start + run_len;
    }
    found
}

fn plausible_shift(run: &[u8]) -> bool {
    let Ok(raw) = UTF7_BASE64.decode(run) else {
        return false;
    };
    if raw.len() % 2 != 0 {
        return false;
    }
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    match String::from_utf16(&units) {
        Ok(text) => !text.chars().any(char::is_control) && !text.is_ascii(),
        Err(_) => false,
    }
}

fn is_base64_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'+' || ch == b'/'
}

/// Decode UTF-7 (RFC 2152).
///
/// `+-` is a literal `+`. A shift sequence ends at the first non-base64
/// character; a terminating `-` is absorbed. Invalid base64, a dangling
/// UTF-16 byte, or an unpaired surrogate is an error.
pub fn decode_utf7(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut utf16 = Vec::new();
    let mut ix = 0;
    let mut plain_start = 0;

    while ix < bytes.len() {
        if bytes[ix] != b'+' {
            ix += 1;
            continue;
        }

        out.push_str(&s[plain_start..ix]);
        let run_start = ix + 1;
        let run_len = bytes[run_start..]
            .iter()
            .take_while(|&&c| is_base64_char(c))
            .count();
        let run_end = run_start + run_len;

        if run_len == 0 {
            // "+-" is an escaped '+'; a bare '+' passes through
            out.push('+');
        } else {
            let raw = UTF7_BASE64
                .decode(&bytes[run_start..run_end])
                .map_err(|e| MailError::DecodeFailure(format!("UTF-7 base64 at {ix}: {e}")))?;
            if raw.len() % 2 != 0 {
                return Err(MailError::DecodeFailure(format!(
                    "UTF-7 sequence at {ix} has an odd byte count"
                )));
            }
            utf16.clear();
            utf16.extend(
                raw.chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            );
            let text = String::from_utf16(&utf16).map_err(|_| {
                MailError::DecodeFailure(format!("UTF-7 sequence at {ix} is not valid UTF-16"))
            })?;
            out.push_str(&text);
        }

        ix = if bytes.get(run_end) == Some(&b'-') {
            run_end + 1
        } else {
            run_end
        };
        plain_start = ix;
    }

    out.push_str(&s[plain_start..]);
    Ok(out)
}

/// Decode quoted-printable (RFC 2045) text into UTF-8.
///
/// Soft line breaks are removed for both UNIX and DOS endings. Invalid `=`
/// escapes pass through; the decoded bytes must form valid UTF-8.
pub fn decode_quoted_printable(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut ix = 0;

    while ix < bytes.len() {
        if bytes[ix] != b'=' {
            out.push(bytes[ix]);
            ix += 1;
            continue;
        }

        let rest = &bytes[ix + 1..];
        if rest.starts_with(b"\r\n") {
            ix += 3;
        } else if rest.starts_with(b"\n") {
            ix += 2;
        } else if let Some(byte) = rest
            .get(..2)
            .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
            .and_then(|hex| str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(byte);
            ix += 3;
        } else {
            out.push(b'=');
            ix += 1;
        }
    }

    String::from_utf8(out)
        .map_err(|e| MailError::DecodeFailure(format!("quoted-printable result: {e}")))
}
