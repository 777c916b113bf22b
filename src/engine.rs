//! Format detection and the common extraction contract.
//!
//! A file is bound to exactly one engine, chosen from its extension.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::config::ExtractConfig;
use crate::error::{MailError, Result};
use crate::model::attachment::{display_names, AttachmentEntry};
use crate::model::message::NormalizedMessage;
use crate::msg::container::CfbContainer;
use crate::msg::engine::MsgEngine;
use crate::parser::eml::EmlEngine;

/// Field access shared by every engine.
///
/// `None` and empty lists mean the field is absent from the message.
pub trait MessageSource {
    fn sender(&mut self) -> Result<Option<String>>;
    fn recipients(&mut self) -> Result<Vec<String>>;
    fn cc(&mut self) -> Result<Vec<String>>;
    fn subject(&mut self) -> Result<Option<String>>;
    fn date(&mut self) -> Result<Option<String>>;
    fn body(&mut self) -> Result<Option<String>>;
    fn attachments(&mut self) -> Result<&[AttachmentEntry]>;

    /// Build the record, mapping absent fields to empty values.
    fn normalize(&mut self) -> Result<NormalizedMessage> {
        Ok(NormalizedMessage {
            sender: self.sender()?.unwrap_or_default(),
            recipients: self.recipients()?,
            cc: self.cc()?,
            subject: self.subject()?.unwrap_or_default(),
            date: self.date()?.unwrap_or_default(),
            body: self.body()?.unwrap_or_default(),
            attachments: display_names(self.attachments()?),
        })
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Eml,
    Msg,
}

impl Format {
    /// Formats in selection order.
    pub const PRIORITY: [Format; 2] = [Format::Eml, Format::Msg];

    /// The extension this format is bound to, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Eml => ".eml",
            Self::Msg => ".msg",
        }
    }

    /// Pick the format for `path` by exact, case-sensitive extension match.
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (_, extension) = split_extension(&name);
        Self::PRIORITY
            .into_iter()
            .find(|format| format.extension() == extension)
            .ok_or_else(|| MailError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            })
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eml => f.write_str("eml"),
            Self::Msg => f.write_str("msg"),
        }
    }
}

/// Split a file name into base and extension (dot included).
///
/// Leading dots belong to the base, so `.msg` has no extension and
/// `archive.tar.msg` has `.msg`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(dot) => name.split_at(stem_start + dot),
        None => (name, ""),
    }
}

/// An engine bound to one input file.
pub enum Engine {
    Eml(EmlEngine),
    Msg(MsgEngine<CfbContainer<File>>),
}

impl Engine {
    /// Detect the format of `path` and open the matching engine.
    pub fn open(path: impl AsRef<Path>, options: &ExtractConfig) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::detect(path)?;
        debug!(path = %path.display(), format = %format, "Selected engine");
        match format {
            Format::Eml => EmlEngine::open(path).map(Self::Eml),
            Format::Msg => MsgEngine::open(path, options).map(Self::Msg),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Eml(_) => Format::Eml,
            Self::Msg(_) => Format::Msg,
        }
    }

    /// Resolve every field and emit the record.
    pub fn extract(&mut self) -> Result<NormalizedMessage> {
        match self {
            Self::Eml(eml) => eml.normalize(),
            Self::Msg(msg) => msg.finish(),
        }
    }

    /// Attachments with their raw bytes.
    pub fn attachments(&mut self) -> Result<&[AttachmentEntry]> {
        match self {
            Self::Eml(eml) => eml.attachments(),
            Self::Msg(msg) => msg.attachments(),
        }
    }
}

/// Open `path` and return its normalized record.
pub fn extract_file(path: impl AsRef<Path>, options: &ExtractConfig) -> Result<NormalizedMessage> {
    Engine::open(path, options)?.extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("mail.msg"), ("mail", ".msg"));
        assert_eq!(split_extension("a.b.eml"), ("a.b", ".eml"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".msg"), (".msg", ""));
        assert_eq!(split_extension("..hidden.eml"), ("..hidden", ".eml"));
    }

    #[test]
    fn test_detect_known_formats() {
        assert_eq!(Format::detect(Path::new("dir/x.eml")).unwrap(), Format::Eml);
        assert_eq!(Format::detect(Path::new("dir/x.msg")).unwrap(), Format::Msg);
    }

    #[test]
    fn test_detect_is_case_sensitive() {
        let err = Format::detect(Path::new("x.MSG")).unwrap_err();
        assert!(matches!(
            err,
            MailError::UnsupportedFormat { ref extension, .. } if extension == ".MSG"
        ));
    }

    #[test]
    fn test_txt_is_unsupported() {
        let err = extract_file("notes.txt", &ExtractConfig::default()).unwrap_err();
        match err {
            MailError::UnsupportedFormat { path, extension } => {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(extension, ".txt");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = extract_file("/nonexistent/dir/mail.msg", &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, MailError::FileNotFound(_)));
    }

    #[test]
    fn test_eml_extracts_through_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.eml");
        std::fs::write(&path, "From: a@example.com\r\nSubject: Hi\r\n\r\nHello\r\n").unwrap();

        let mut engine = Engine::open(&path, &ExtractConfig::default()).unwrap();
        assert_eq!(engine.format(), Format::Eml);
        let record = engine.extract().unwrap();
        assert_eq!(record.sender, "a@example.com");
        assert_eq!(record.subject, "Hi");
    }
}
