//! Editor configuration.
//!
//! Configuration is stored in a `.pagelayout.toml` file in the workspace:
//!
//! ```toml
//! format = "yaml"
//! output_dir = "public"
//!
//! [export]
//! file_stem = "site"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use formsync::{ExportOptions, Format, SyncConfig};
use serde::{Deserialize, Serialize};

/// Name of the configuration file inside a workspace.
pub const CONFIG_FILE: &str = ".pagelayout.toml";

/// Root editor configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Text format of the raw view.
    pub format: Format,
    /// Export settings.
    pub export: ExportConfig,
    /// Directory exports are saved to. Relative paths are resolved against
    /// the workspace; defaults to the workspace itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Export section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name of exports without extension.
    pub file_stem: String,
    /// Overrides the MIME type derived from the format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_stem: "site".to_string(),
            mime_type: None,
        }
    }
}

impl EditorConfig {
    /// Loads the configuration of `workspace`; a missing file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("loaded {}: format {}", path.display(), config.format);
        Ok(config)
    }

    /// Writes the configuration into `workspace`.
    pub fn save(&self, workspace: &Path) -> anyhow::Result<PathBuf> {
        let path = workspace.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Picks the format from a document file name, e.g. `site.json`.
    pub fn with_format_of(mut self, file_name: &Path) -> Self {
        if let Some(format) = file_name
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
        {
            self.format = format;
        }
        self
    }

    /// Session configuration derived from this file.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            format: self.format,
            export: ExportOptions {
                file_stem: self.export.file_stem.clone(),
                mime_type: self.export.mime_type.clone(),
            },
        }
    }

    /// Resolves the export directory against `workspace`.
    pub fn output_dir(&self, workspace: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => workspace.join(dir),
            None => workspace.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_site_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        let sync = config.sync_config();
        assert_eq!(sync.format, Format::Yaml);
        assert_eq!(sync.export.filename(sync.format), "site.yaml");
        assert_eq!(sync.export.mime_type(sync.format), "text/yaml");
        assert_eq!(config.output_dir(dir.path()), dir.path());
    }

    #[test]
    fn test_partial_export_table_keeps_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "format = \"json\"\noutput_dir = \"public\"\n[export]\nmime_type = \"application/x-page\"\n",
        )
        .unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.export.file_stem, "site");
        assert_eq!(config.output_dir(dir.path()), dir.path().join("public"));
        assert_eq!(
            config.sync_config().export.mime_type(Format::Json),
            "application/x-page"
        );
    }

    #[test]
    fn test_save_round_trip_and_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::default().with_format_of(Path::new("page.toml"));
        assert_eq!(config.format, Format::Toml);
        config.save(dir.path()).unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), config);

        fs::write(dir.path().join(CONFIG_FILE), "format = 3\n").unwrap();
        let err = EditorConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
