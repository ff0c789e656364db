//! File-backed snapshot persistence.
//!
//! One snapshot per data directory, stored as `editor_state_v1.json`.

use std::path::{Path, PathBuf};

use crate::error::EditorResult;
use crate::snapshot::{Snapshot, STORAGE_KEY};

/// Reads and writes the editor snapshot in a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `data_dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> EditorResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Store backed by an explicit snapshot file path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the parent directory cannot be created.
    pub fn for_file(path: &Path) -> EditorResult<FileStore> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(FileStore {
            path: path.to_path_buf(),
        })
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{STORAGE_KEY}.json"))
    }

    /// Data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write a snapshot. Failures are logged, not returned.
    ///
    /// Returns whether the write succeeded.
    #[must_use]
    pub fn save(&self, snapshot: &Snapshot) -> bool {
        write_snapshot(&self.path(), snapshot)
    }

    /// Read the snapshot leniently. A missing file gives `None`.
    #[must_use]
    pub fn load(&self) -> Option<Snapshot> {
        read_snapshot(&self.path())
    }

    /// Remove the snapshot file if present.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for failures other than a missing file.
    pub fn clear(&self) -> EditorResult<()> {
        remove_snapshot(&self.path())
    }
}

/// Snapshot stored at an arbitrary path, as used by the command line host.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot. Failures are logged, not returned.
    #[must_use]
    pub fn save(&self, snapshot: &Snapshot) -> bool {
        write_snapshot(&self.path, snapshot)
    }

    /// Read the snapshot leniently. A missing file gives `None`.
    #[must_use]
    pub fn load(&self) -> Option<Snapshot> {
        read_snapshot(&self.path)
    }

    /// Remove the snapshot file if present.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for failures other than a missing file.
    pub fn clear(&self) -> EditorResult<()> {
        remove_snapshot(&self.path)
    }
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> bool {
    let json = match snapshot.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize snapshot: {e}");
            return false;
        }
    };
    if let Err(e) = std::fs::write(path, json) {
        tracing::warn!("Failed to persist snapshot to {}: {e}", path.display());
        return false;
    }
    tracing::debug!(
        "Saved {} element(s) to {}",
        snapshot.text_elements.len(),
        path.display()
    );
    true
}

fn read_snapshot(path: &Path) -> Option<Snapshot> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(Snapshot::parse_lenient(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Failed to read snapshot {}: {e}", path.display());
            None
        }
    }
}

fn remove_snapshot(path: &Path) -> EditorResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::element::Language;
    use crate::layout::Surface;

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(tmp.path().join("state")).expect("store");
        assert!(store.load().is_none());

        let mut doc = Document::new(800.0, 600.0);
        doc.add(Language::Arabic);
        doc.add(Language::Russian);
        assert!(store.save(&Snapshot::from_document(&doc, Vec::new())));
        assert!(store.path().ends_with("editor_state_v1.json"));

        let restored = store
            .load()
            .expect("snapshot")
            .into_document(Surface::default());
        assert_eq!(restored.element_count(), 2);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(tmp.path()).expect("store");
        std::fs::write(store.path(), "not json").expect("write");
        let snapshot = store.load().expect("lenient snapshot");
        assert!(snapshot.text_elements.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(tmp.path()).expect("store");
        assert!(store.save(&Snapshot::default()));
        store.clear().expect("clear");
        assert!(store.load().is_none());
        store.clear().expect("clear again");
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let blocked = tmp.path().join("blocked");
        std::fs::write(&blocked, "file, not dir").expect("write");
        let file = SnapshotStore::for_file(&tmp.path().join("ok.json")).expect("file store");
        assert!(file.save(&Snapshot::default()));

        let broken = FileStore {
            path: blocked.join("state.json"),
        };
        assert!(!broken.save(&Snapshot::default()));
    }
}
