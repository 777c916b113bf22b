//! In-memory `.msg` builder for unit tests.

use std::io::{Cursor, Write};
use std::path::Path;

use cfb::CompoundFile;

use super::container::CfbContainer;

pub(crate) struct MsgFixture {
    comp: CompoundFile<Cursor<Vec<u8>>>,
}

impl MsgFixture {
    pub(crate) fn new() -> Self {
        let comp = CompoundFile::create(Cursor::new(Vec::new())).expect("create compound file");
        Self { comp }
    }

    /// Write raw bytes at `path`, creating parent storages as needed.
    pub(crate) fn stream(mut self, path: &str, data: &[u8]) -> Self {
        let full = Path::new("/").join(path);
        let mut storage = std::path::PathBuf::from("/");
        if let Some(parent) = full.parent() {
            for component in parent.components().skip(1) {
                storage.push(component);
                if !self.comp.exists(&storage) {
                    self.comp.create_storage(&storage).expect("create storage");
                }
            }
        }
        let mut stream = self.comp.create_stream(&full).expect("create stream");
        stream.write_all(data).expect("write stream");
        stream.flush().expect("flush stream");
        drop(stream);
        self
    }

    /// 8-bit string property (`001E`).
    pub(crate) fn ascii(self, path: &str, text: &str) -> Self {
        self.stream(&format!("{path}001E"), text.as_bytes())
    }

    /// UTF-16LE string property (`001F`).
    pub(crate) fn unicode(self, path: &str, text: &str) -> Self {
        let data: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        self.stream(&format!("{path}001F"), &data)
    }

    /// Binary property (`0102`).
    pub(crate) fn binary(self, path: &str, data: &[u8]) -> Self {
        self.stream(&format!("{path}0102"), data)
    }

    pub(crate) fn build(mut self) -> CfbContainer<Cursor<Vec<u8>>> {
        self.comp.flush().expect("flush compound file");
        let bytes = self.comp.into_inner().into_inner();
        CfbContainer::from_reader("fixture.msg", Cursor::new(bytes)).expect("reopen fixture")
    }
}
