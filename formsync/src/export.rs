//! Export of the raw text as a downloadable artifact.
//!
//! Export is never gated on validity: the artifact always carries exactly
//! the current raw text, so a half-finished document can be saved and fixed
//! later.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::Context;

use crate::{codec::Format, config::ExportOptions};

/// Bytes handed to the host's file-save mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl ExportArtifact {
    /// Views the payload as text.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Wraps `raw_text` unchanged into an artifact.
pub fn export_text(raw_text: &str, options: &ExportOptions, format: Format) -> ExportArtifact {
    ExportArtifact {
        bytes: raw_text.as_bytes().to_vec(),
        filename: options.filename(format),
        mime_type: options.mime_type(format),
    }
}

/// File-save collaborator supplied by the host environment.
pub trait SaveTarget {
    /// Saves the artifact and returns where it ended up.
    fn save(&mut self, artifact: &ExportArtifact) -> anyhow::Result<PathBuf>;
}

/// Saves artifacts into a directory.
///
/// An existing file with the same name is first copied to a timestamped
/// backup next to it.
#[derive(Debug, Clone)]
pub struct DirTarget {
    dir: PathBuf,
}

impl DirTarget {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl SaveTarget for DirTarget {
    fn save(&mut self, artifact: &ExportArtifact) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(&artifact.filename);

        if path.exists() {
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
            let bk = format!(
                "bk-{:?}.{ext}",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );
            let backup_path = path.with_extension(bk);
            fs::copy(&path, &backup_path)
                .with_context(|| format!("Failed to back up {}", path.display()))?;
            debug!("backed up {} to {}", path.display(), backup_path.display());
        }

        fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "exported {} ({}, {} bytes)",
            path.display(),
            artifact.mime_type,
            artifact.bytes.len()
        );
        Ok(path)
    }
}
