//! Shared helpers: fixture paths and a `.msg` writer built on `cfb`.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Collects property streams, then writes them as one compound file.
///
/// Mirrors the crate's unit-test fixture builder, which is `cfg(test)` and
/// crate-private and so not visible from integration tests.
#[derive(Default)]
pub struct MsgBuilder {
    streams: Vec<(String, Vec<u8>)>,
}

impl MsgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, path: &str, data: &[u8]) -> Self {
        self.streams.push((path.to_string(), data.to_vec()));
        self
    }

    /// `001E` string stream.
    pub fn ascii(self, path: &str, text: &str) -> Self {
        self.raw(&format!("{path}001E"), text.as_bytes())
    }

    /// `001F` UTF-16LE string stream.
    pub fn unicode(self, path: &str, text: &str) -> Self {
        let data: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        self.raw(&format!("{path}001F"), &data)
    }

    /// `0102` binary stream.
    pub fn binary(self, path: &str, data: &[u8]) -> Self {
        self.raw(&format!("{path}0102"), data)
    }

    /// A typical message: transport headers, subject, body, two attachments.
    pub fn sample() -> Self {
        Self::new()
            .unicode(
                "__substg1.0_007D",
                "Microsoft Mail Internet Headers Version 2.0\r\n\
From: Ana Ruiz <ana@example.com>\r\n\
To: bob@example.com, \"Stone, Carl\" <carl@example.com>\r\n\
Cc: dana@example.com\r\n\
Date: Tue, 09 May 2017 14:05:00 +0000\r\n\
\r\n",
            )
            .unicode("__substg1.0_0C1A", "Not Used")
            .unicode("__substg1.0_0C1F", "not-used@example.com")
            .unicode("__substg1.0_0037", "Budget review")
            .unicode("__substg1.0_1000", "Numbers attached.\r\n")
            .unicode("__attach_version1.0_#00000000/__substg1.0_3707", "budget.xlsx")
            .binary("__attach_version1.0_#00000000/__substg1.0_3701", b"PK\x03\x04")
            .ascii("__attach_version1.0_#00000001/__substg1.0_3704", "NOTES~1.TXT")
            .binary("__attach_version1.0_#00000001/__substg1.0_3701", b"notes")
    }

    /// Write the compound file to `path`.
    pub fn write(self, path: &Path) {
        let file = std::fs::File::create(path).expect("create msg file");
        let mut comp = cfb::CompoundFile::create(file).expect("create compound file");
        for (name, data) in &self.streams {
            let full = Path::new("/").join(name);
            let mut storage = PathBuf::from("/");
            if let Some(parent) = full.parent() {
                for component in parent.components().skip(1) {
                    storage.push(component);
                    if !comp.exists(&storage) {
                        comp.create_storage(&storage).expect("create storage");
                    }
                }
            }
            let mut stream = comp.create_stream(&full).expect("create stream");
            stream.write_all(data).expect("write stream");
        }
        comp.flush().expect("flush compound file");
    }

    /// Serialize to bytes through a temporary file.
    pub fn to_bytes(self) -> Vec<u8> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.msg");
        self.write(&path);
        std::fs::read(&path).expect("read msg file")
    }
}
