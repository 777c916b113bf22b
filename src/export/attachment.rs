//! Save attachment bytes to disk.

use std::path::{Path, PathBuf};

use crate::error::{MailError, Result};
use crate::model::attachment::AttachmentEntry;

/// Write every attachment into `output_dir` under its display name.
///
/// The directory is created if needed. Existing files are never
/// overwritten: a `_N` counter is appended instead. Returns the written
/// paths in attachment order.
pub fn save_attachments(entries: &[AttachmentEntry], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| MailError::io(output_dir, e))?;

    let mut paths = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let filename = sanitize_filename_part(&entry.display_name(idx), 150);
        let path = unique_path(&output_dir.join(&filename))?;
        std::fs::write(&path, &entry.data).map_err(|e| MailError::io(&path, e))?;
        tracing::debug!(path = %path.display(), size = entry.data.len(), "Saved attachment");
        paths.push(path);
    }
    Ok(paths)
}

/// Replace anything but alphanumerics and `-._@` with `_`, truncated to `max_len` chars.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(MailError::ExportError(format!(
        "no free file name for {}",
        path.display()
    )))
}
