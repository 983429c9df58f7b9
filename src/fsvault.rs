//! Filesystem-backed vault: a directory tree of markdown notes.
//!
//! Note paths are vault-relative with `/` separators regardless of
//! platform, so rule files and logs stay portable. Writes go through a
//! temp file plus rename to avoid leaving a half-written note behind if
//! the process dies mid-write.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ClipmarkError;
use crate::vault::Vault;

/// A vault rooted at a directory; every `.md` file under it is a note.
pub struct FsVault {
    root: PathBuf,
    active: Option<String>,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active: None,
        }
    }

    /// Designate the note the active-note commands operate on. A
    /// filesystem has no cursor, so the caller supplies one explicitly.
    pub fn with_active_note(mut self, path: impl Into<String>) -> Self {
        self.active = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, note: &str) -> PathBuf {
        self.root.join(note)
    }

    fn storage_err(path: &str, detail: impl Display) -> ClipmarkError {
        ClipmarkError::Storage {
            path: path.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read(&self, path: &str) -> Result<String, ClipmarkError> {
        tokio::fs::read_to_string(self.abs(path))
            .await
            .map_err(|e| Self::storage_err(path, e))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), ClipmarkError> {
        let abs = self.abs(path);
        if let Some(parent) = abs.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::storage_err(path, e))?;
        }

        // Atomic write: temp file in the same directory, then rename.
        let tmp = abs.with_extension("md.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| Self::storage_err(path, e))?;
        tokio::fs::rename(&tmp, &abs)
            .await
            .map_err(|e| Self::storage_err(path, e))?;
        debug!("wrote {} bytes to '{}'", text.len(), path);
        Ok(())
    }

    async fn append(&self, path: &str, text: &str) -> Result<(), ClipmarkError> {
        let abs = self.abs(path);
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&abs)
            .await
            .map_err(|e| Self::storage_err(path, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| Self::storage_err(path, e))?;
        file.flush().await.map_err(|e| Self::storage_err(path, e))?;
        debug!("appended {} bytes to '{}'", text.len(), path);
        Ok(())
    }

    async fn list_notes(&self, prefix: &str) -> Result<Vec<String>, ClipmarkError> {
        let mut notes = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| Self::storage_err(prefix, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Self::storage_err(prefix, e))?;
            let rel = rel.to_string_lossy().replace('\\', "/");
            if rel.starts_with(prefix) {
                notes.push(rel);
            }
        }
        // Stable processing order for batches.
        notes.sort();
        Ok(notes)
    }

    async fn active_note(&self) -> Option<String> {
        self.active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> (tempfile::TempDir, FsVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());
        (dir, vault)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let (_dir, vault) = vault();
        vault
            .write("Articles/note.md", "---\nurl: http://x.test\n---\n")
            .await
            .unwrap();
        let text = vault.read("Articles/note.md").await.unwrap();
        assert_eq!(text, "---\nurl: http://x.test\n---\n");
    }

    #[tokio::test]
    async fn write_leaves_no_temp_file_behind() {
        let (dir, vault) = vault();
        vault.write("note.md", "body").await.unwrap();
        assert!(!dir.path().join("note.md.tmp").exists());
        assert!(dir.path().join("note.md").exists());
    }

    #[tokio::test]
    async fn append_extends_existing_note() {
        let (_dir, vault) = vault();
        vault.write("note.md", "start").await.unwrap();
        vault.append("note.md", " end").await.unwrap();
        assert_eq!(vault.read("note.md").await.unwrap(), "start end");
    }

    #[tokio::test]
    async fn append_to_missing_note_is_a_storage_error() {
        let (_dir, vault) = vault();
        let err = vault.append("missing.md", "x").await.unwrap_err();
        assert!(matches!(err, ClipmarkError::Storage { .. }));
    }

    #[tokio::test]
    async fn list_notes_filters_by_prefix_and_sorts() {
        let (_dir, vault) = vault();
        vault.write("Articles/b.md", "").await.unwrap();
        vault.write("Articles/a.md", "").await.unwrap();
        vault.write("Journal/c.md", "").await.unwrap();
        vault.write("Articles/readme.txt", "").await.unwrap();

        let notes = vault.list_notes("Articles").await.unwrap();
        assert_eq!(notes, ["Articles/a.md", "Articles/b.md"]);

        let all = vault.list_notes("").await.unwrap();
        assert_eq!(all, ["Articles/a.md", "Articles/b.md", "Journal/c.md"]);
    }

    #[tokio::test]
    async fn active_note_is_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path()).with_active_note("inbox/today.md");
        assert_eq!(vault.active_note().await.as_deref(), Some("inbox/today.md"));

        let bare = FsVault::new(dir.path());
        assert_eq!(bare.active_note().await, None);
    }
}
