//! Attachment discovery inside `.msg` containers.
//!
//! Each attachment lives in its own top-level storage named
//! `__attach_version1.0_#XXXXXXXX`; only that first level is examined.

use tracing::debug;

use super::container::{Container, ContainerEntry};
use super::property::{ATTACH_DATA, ATTACH_LONG_FILENAME, ATTACH_SHORT_FILENAME};
use super::stream::{StreamName, StreamResolver};
use crate::error::Result;
use crate::model::attachment::AttachmentEntry;

pub const ATTACHMENT_PREFIX: &str = "__attach";

/// Distinct attachment storages, in the order their first stream appears.
pub fn attachment_dirs(entries: &[ContainerEntry]) -> Vec<String> {
    let mut dirs: Vec<String> = Vec::new();
    for entry in entries {
        // A top-level stream is not a storage even if its name matches.
        if entry.segments.len() < 2 {
            continue;
        }
        let Some(top) = entry.top() else { continue };
        if top.starts_with(ATTACHMENT_PREFIX) && !dirs.iter().any(|d| d == top) {
            dirs.push(top.to_string());
        }
    }
    dirs
}

/// Read every attachment of the container behind `resolver`.
pub fn enumerate<C: Container>(resolver: &mut StreamResolver<C>) -> Result<Vec<AttachmentEntry>> {
    let entries = resolver.container().list_entries()?;
    let dirs = attachment_dirs(&entries);

    let mut attachments = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let long_filename = resolver.string(&StreamName::scoped(dir, ATTACH_LONG_FILENAME))?;
        let short_filename = resolver.string(&StreamName::scoped(dir, ATTACH_SHORT_FILENAME))?;
        let data = resolver
            .binary(&StreamName::scoped(dir, ATTACH_DATA))?
            .unwrap_or_default();

        debug!(
            storage = %dir,
            long = long_filename.as_deref().unwrap_or(""),
            size = data.len(),
            "Found attachment"
        );
        attachments.push(AttachmentEntry {
            long_filename,
            short_filename,
            data,
        });
    }
    Ok(attachments)
}
