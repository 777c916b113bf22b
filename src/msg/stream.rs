//! Property value lookup with the ASCII/Unicode dual-stream convention.
//!
//! A string property may be stored as `<name>001E` (8-bit), `<name>001F`
//! (UTF-16LE), or both, depending on the client that wrote the file.

use tracing::debug;

use super::container::Container;
use super::property::PROPERTY_PREFIX;
use crate::error::Result;

pub const ASCII_SUFFIX: &str = "001E";
pub const UNICODE_SUFFIX: &str = "001F";
pub const BINARY_SUFFIX: &str = "0102";

/// Which physical stream wins when both string variants exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Ascii,
    #[default]
    Unicode,
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "unicode" => Ok(Self::Unicode),
            other => Err(format!("unknown stream variant '{other}' (expected ascii or unicode)")),
        }
    }
}

/// Logical path of a property, without its type suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamName {
    segments: Vec<String>,
}

impl StreamName {
    /// A top-level property, e.g. `__substg1.0_0037`.
    pub fn property(tag: &str) -> Self {
        Self {
            segments: vec![format!("{PROPERTY_PREFIX}{tag}")],
        }
    }

    /// A property inside a storage, e.g. `__attach_version1.0_#00000000/__substg1.0_3707`.
    pub fn scoped(storage: &str, tag: &str) -> Self {
        Self {
            segments: vec![storage.to_string(), format!("{PROPERTY_PREFIX}{tag}")],
        }
    }

    /// Physical stream path with `suffix` appended to the last segment.
    pub fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.segments.join("/"))
    }
}

/// Resolves property values over an owned [`Container`].
pub struct StreamResolver<C> {
    container: C,
    prefer: Variant,
}

impl<C: Container> StreamResolver<C> {
    pub fn new(container: C) -> Self {
        Self {
            container,
            prefer: Variant::default(),
        }
    }

    /// Set the variant used by [`StreamResolver::string`].
    pub fn with_preference(mut self, prefer: Variant) -> Self {
        self.prefer = prefer;
        self
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// Read a physical stream, `None` if it does not exist.
    pub fn raw(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        if !self.container.exists(path) {
            return Ok(None);
        }
        self.container.open_stream(path).map(Some)
    }

    /// String value of `name` using the configured preference.
    pub fn string(&mut self, name: &StreamName) -> Result<Option<String>> {
        let prefer = self.prefer;
        self.string_with(name, prefer)
    }

    /// String value of `name`.
    ///
    /// Only one variant present: that one. Both present: `prefer`. Neither: `None`.
    pub fn string_with(&mut self, name: &StreamName, prefer: Variant) -> Result<Option<String>> {
        let ascii = self.raw(&name.with_suffix(ASCII_SUFFIX))?;
        let unicode = self.raw(&name.with_suffix(UNICODE_SUFFIX))?;

        let value = match (ascii, unicode) {
            (None, None) => None,
            (Some(ascii), None) => Some(decode_ascii(&ascii)),
            (None, Some(unicode)) => Some(decode_unicode(&unicode)),
            (Some(ascii), Some(unicode)) => Some(match prefer {
                Variant::Ascii => decode_ascii(&ascii),
                Variant::Unicode => decode_unicode(&unicode),
            }),
        };

        debug!(
            stream = %name.with_suffix(""),
            found = value.is_some(),
            "Resolved string property"
        );
        Ok(value)
    }

    /// Raw bytes of the binary (`0102`) variant of `name`.
    pub fn binary(&mut self, name: &StreamName) -> Result<Option<Vec<u8>>> {
        self.raw(&name.with_suffix(BINARY_SUFFIX))
    }
}

/// 8-bit strings: UTF-8 when valid, otherwise Windows-1252, which accepts every byte.
fn decode_ascii(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };
    strip_nul(text)
}

fn decode_unicode(bytes: &[u8]) -> String {
    let (decoded, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
    strip_nul(decoded.into_owned())
}

fn strip_nul(mut text: String) -> String {
    let kept = text.trim_end_matches('\0').len();
    text.truncate(kept);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::fixture::MsgFixture;

    const SUBJECT: &str = "__substg1.0_0037";

    #[test]
    fn test_ascii_only_returned_unmodified() {
        let container = MsgFixture::new().ascii(SUBJECT, "Quarterly numbers").build();
        let mut resolver = StreamResolver::new(container);
        let value = resolver.string(&StreamName::property("0037")).unwrap();
        assert_eq!(value.as_deref(), Some("Quarterly numbers"));
    }

    #[test]
    fn test_unicode_only_decoded() {
        let container = MsgFixture::new().unicode(SUBJECT, "Reunión – año").build();
        let mut resolver = StreamResolver::new(container);
        let value = resolver.string(&StreamName::property("0037")).unwrap();
        assert_eq!(value.as_deref(), Some("Reunión – año"));
    }

    #[test]
    fn test_both_default_prefers_unicode() {
        let container = MsgFixture::new()
            .ascii(SUBJECT, "ascii value")
            .unicode(SUBJECT, "unicode value")
            .build();
        let mut resolver = StreamResolver::new(container);
        let name = StreamName::property("0037");
        assert_eq!(resolver.string(&name).unwrap().as_deref(), Some("unicode value"));
        assert_eq!(
            resolver.string_with(&name, Variant::Ascii).unwrap().as_deref(),
            Some("ascii value")
        );
    }

    #[test]
    fn test_configured_ascii_preference() {
        let container = MsgFixture::new()
            .ascii(SUBJECT, "ascii value")
            .unicode(SUBJECT, "unicode value")
            .build();
        let mut resolver = StreamResolver::new(container).with_preference(Variant::Ascii);
        let value = resolver.string(&StreamName::property("0037")).unwrap();
        assert_eq!(value.as_deref(), Some("ascii value"));
    }

    #[test]
    fn test_neither_is_absent() {
        let container = MsgFixture::new().ascii("__substg1.0_1000", "body").build();
        let mut resolver = StreamResolver::new(container);
        assert_eq!(resolver.string(&StreamName::property("0037")).unwrap(), None);
    }

    #[test]
    fn test_trailing_nul_stripped() {
        let container = MsgFixture::new().unicode(SUBJECT, "Hello\0").build();
        let mut resolver = StreamResolver::new(container);
        let value = resolver.string(&StreamName::property("0037")).unwrap();
        assert_eq!(value.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_ascii_windows_1252_fallback() {
        let container = MsgFixture::new()
            .stream("__substg1.0_0037001E", b"caf\xe9")
            .build();
        let mut resolver = StreamResolver::new(container);
        let value = resolver.string(&StreamName::property("0037")).unwrap();
        assert_eq!(value.as_deref(), Some("café"));
    }

    #[test]
    fn test_scoped_binary() {
        let dir = "__attach_version1.0_#00000000";
        let container = MsgFixture::new()
            .binary(&format!("{dir}/__substg1.0_3701"), &[0, 159, 146, 150])
            .build();
        let mut resolver = StreamResolver::new(container);
        let data = resolver.binary(&StreamName::scoped(dir, "3701")).unwrap();
        assert_eq!(data, Some(vec![0, 159, 146, 150]));
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("ASCII".parse::<Variant>(), Ok(Variant::Ascii));
        assert!("latin1".parse::<Variant>().is_err());
    }
}
