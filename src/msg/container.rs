//! Read-only access to OLE compound files.
//!
//! The engine only needs three operations: test whether a stream exists,
//! read a stream, and list all streams. Sector and directory parsing is
//! left to the `cfb` crate.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use cfb::CompoundFile;

use crate::error::{MailError, Result};

/// A stream inside a container, identified by its path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Path segments from the root, e.g. `["__attach_version1.0_#00000000", "__substg1.0_37010102"]`.
    pub segments: Vec<String>,
    /// Stream length in bytes.
    pub len: u64,
}

impl ContainerEntry {
    /// The top-level segment (the storage or stream directly under the root).
    pub fn top(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Segments joined with `/`.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// Compound-file operations used by the MSG engine.
pub trait Container {
    /// `true` if `path` names a stream (not a storage).
    fn exists(&self, path: &str) -> bool;

    /// Read the whole stream at `path`.
    fn open_stream(&mut self, path: &str) -> Result<Vec<u8>>;

    /// All streams, depth first, children in directory order.
    fn list_entries(&self) -> Result<Vec<ContainerEntry>>;
}

/// [`Container`] backed by `cfb::CompoundFile`.
pub struct CfbContainer<F> {
    path: PathBuf,
    inner: CompoundFile<F>,
}

impl CfbContainer<File> {
    /// Open a compound file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MailError::io(path, e))?;
        Self::from_reader(path, file)
    }
}

impl<F: Read + Seek> CfbContainer<F> {
    /// Wrap any seekable reader. `path` labels error messages.
    pub fn from_reader(path: impl AsRef<Path>, reader: F) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = CompoundFile::open(reader).map_err(|e| MailError::unreadable(&path, e))?;
        Ok(Self { path, inner })
    }

    fn collect_storage(&self, storage: &Path, out: &mut Vec<ContainerEntry>) -> Result<()> {
        let children = self
            .inner
            .read_storage(storage)
            .map_err(|e| MailError::unreadable(&self.path, e))?;

        for child in children {
            if child.is_stream() {
                out.push(ContainerEntry {
                    segments: segments_of(child.path()),
                    len: child.len(),
                });
            } else if child.is_storage() {
                self.collect_storage(child.path(), out)?;
            }
        }
        Ok(())
    }
}

impl<F: Read + Seek> Container for CfbContainer<F> {
    fn exists(&self, path: &str) -> bool {
        self.inner.is_stream(absolute(path))
    }

    fn open_stream(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut stream = self
            .inner
            .open_stream(absolute(path))
            .map_err(|e| MailError::unreadable(&self.path, format!("stream {path}: {e}")))?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|e| MailError::unreadable(&self.path, format!("stream {path}: {e}")))?;
        Ok(buf)
    }

    fn list_entries(&self) -> Result<Vec<ContainerEntry>> {
        let mut entries = Vec::new();
        self.collect_storage(Path::new("/"), &mut entries)?;
        Ok(entries)
    }
}

fn absolute(path: &str) -> PathBuf {
    Path::new("/").join(path.trim_start_matches('/'))
}

fn segments_of(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
