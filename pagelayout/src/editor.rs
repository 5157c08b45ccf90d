//! Editing context of a page layout document.
//!
//! [`EditorContext`] is the state a page editor holds: the workspace, the
//! loaded configuration and the shared synchronization session the text and
//! form views are attached to.

use std::path::{Path, PathBuf};

use anyhow::Context;
use formsync::{DirTarget, SaveTarget, Session, SharedSession, TextCodec, codec::YamlCodec};

use crate::{
    config::EditorConfig,
    layout::{INITIAL_DOCUMENT, PageLayout},
    schema::page_schema,
};

/// The page editor's state.
#[derive(Debug, Clone)]
pub struct EditorContext {
    /// Workspace directory holding the configuration file.
    pub workspace: PathBuf,
    /// Configuration the session was opened with.
    pub config: EditorConfig,
    session: SharedSession,
}

impl EditorContext {
    /// Loads the workspace configuration and opens a session on the initial
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn open(workspace: impl AsRef<Path>) -> anyhow::Result<Self> {
        let workspace = workspace.as_ref().to_path_buf();
        let config = EditorConfig::load(&workspace)?;
        Self::with_config(workspace, config)
    }

    /// Opens a session using an already loaded configuration.
    pub fn with_config(workspace: PathBuf, config: EditorConfig) -> anyhow::Result<Self> {
        let schema = page_schema().context("Failed to read the page schema")?;
        let sync_config = config.sync_config();

        // The initial document is authored in YAML; other formats start from
        // its value.
        let session = match config.format {
            formsync::Format::Yaml => Session::new(INITIAL_DOCUMENT, schema, sync_config)?,
            format => {
                let value = YamlCodec.parse(INITIAL_DOCUMENT)?;
                Session::from_value(value, schema, sync_config)
                    .with_context(|| format!("Initial document cannot be written as {format}"))?
            }
        };
        info!(
            "page editor opened in {} ({})",
            workspace.display(),
            config.format
        );

        Ok(Self {
            workspace,
            config,
            session: SharedSession::new(session),
        })
    }

    /// The session views attach to.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Current document as typed structures.
    ///
    /// # Errors
    ///
    /// Fails if the document does not currently match [`PageLayout`] or the
    /// session is mid-transition.
    pub fn page(&self) -> anyhow::Result<PageLayout> {
        let page = self
            .session
            .with(|s| s.typed::<PageLayout>())
            .ok_or_else(|| anyhow!("session is busy"))?
            .context("Document is not a valid page layout")?;
        Ok(page)
    }

    /// Exports the current raw text through `target`.
    pub fn export_to(&self, target: &mut dyn SaveTarget) -> anyhow::Result<PathBuf> {
        let artifact = self
            .session
            .export()
            .ok_or_else(|| anyhow!("session is busy"))?;
        target.save(&artifact)
    }

    /// Exports the current raw text into the configured output directory.
    pub fn export(&self) -> anyhow::Result<PathBuf> {
        let mut target = DirTarget::new(self.config.output_dir(&self.workspace));
        self.export_to(&mut target)
    }
}
