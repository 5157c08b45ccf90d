//! Session configuration.
//!
//! Configuration is usually stored in a TOML file next to the document:
//!
//! ```toml
//! format = "yaml"
//!
//! [export]
//! file_stem = "site"
//! ```

use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::codec::Format;

/// Options of the export function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// File name without extension; the extension follows the format.
    pub file_stem: String,
    /// Overrides the MIME type label derived from the format.
    pub mime_type: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_stem: "document".to_string(),
            mime_type: None,
        }
    }
}

impl ExportOptions {
    /// Full file name for an artifact in `format`.
    pub fn filename(&self, format: Format) -> String {
        format!("{}.{}", self.file_stem, format.extension())
    }

    /// MIME type label for an artifact in `format`.
    pub fn mime_type(&self, format: Format) -> String {
        self.mime_type
            .clone()
            .unwrap_or_else(|| format.mime_type().to_string())
    }
}

/// Configuration of a synchronization session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Text format of the raw view.
    pub format: Format,
    pub export: ExportOptions,
}

impl SyncConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    /// Loads a configuration file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("loaded config {}: format {}", path.display(), config.format);
        Ok(config)
    }

    /// Writes the configuration as pretty TOML.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}
