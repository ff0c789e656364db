//! A loaded state file: document, fonts and session.

use std::path::Path;
use std::sync::Arc;

use verse_core::{
    EditorConfig, EditorSession, FileStore, SharedMeasure, Snapshot, SnapshotStore,
};
use verse_renderer::FontRegistry;

use crate::{CliError, CliResult};

/// The state file together with everything restored from it.
#[derive(Debug)]
pub struct Workspace {
    store: FileStore,
    fonts: Arc<FontRegistry>,
    session: EditorSession,
}

impl Workspace {
    /// Load `path`, restoring its fonts. A missing or damaged file gives an
    /// empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file's directory cannot be created.
    pub async fn open(path: &Path, config: EditorConfig, system_fonts: bool) -> CliResult<Self> {
        let store = SnapshotStore::for_file(path)?;
        let snapshot = store.load().unwrap_or_else(|| {
            tracing::debug!("No state at {}, starting empty", path.display());
            Snapshot::default()
        });

        let fonts = Arc::new(if system_fonts {
            FontRegistry::with_system_fonts()
        } else {
            FontRegistry::new()
        });
        let restored = fonts.restore(&snapshot.fonts).await;
        if restored < snapshot.fonts.len() {
            tracing::warn!(
                "Restored {restored} of {} saved font(s)",
                snapshot.fonts.len()
            );
        }

        let document = snapshot.into_document(config.surface);
        let measurer: SharedMeasure = fonts.clone();
        let session = EditorSession::with_document(document, config, measurer);
        tracing::debug!(
            "Opened {} with {} element(s)",
            path.display(),
            session.document().element_count()
        );
        Ok(Self {
            store,
            fonts,
            session,
        })
    }

    /// Write the document and custom fonts back to the state file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::StateNotSaved`] if the file cannot be written.
    pub fn save(&self) -> CliResult<()> {
        let snapshot = Snapshot::from_document(self.session.document(), self.fonts.records());
        if self.store.save(&snapshot) {
            Ok(())
        } else {
            Err(CliError::StateNotSaved(self.store.path().to_path_buf()))
        }
    }

    /// Font registry shared with the session.
    #[must_use]
    pub fn fonts(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    /// Editing session.
    #[must_use]
    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Mutable editing session.
    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }
}
