//! Storage path resolution for the content store.
//!
//! Paths are a pure function of (subfolder, entity id). The layout is one
//! root directory, subdivided by subfolder name, with files named by entity
//! id:
//!
//! ```text
//! {root}/
//! ├── persons/
//! │   └── {person_id}.png
//! ├── thumbnails/
//! │   └── {preview_file_id}.png
//! ├── originals/
//! │   └── {preview_file_id}.png
//! └── preview-files/          (legacy layout, retrieval fallback only)
//!     └── {preview_file_id}.png
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Shared folder holding previews stored under the pre-variant layout.
pub const LEGACY_FOLDER: &str = "preview-files";

/// Resolves canonical and legacy on-disk paths for stored pictures.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at the given content directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the content store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding files for the given subfolder name.
    pub fn folder(&self, subfolder: &str) -> PathBuf {
        self.root.join(subfolder)
    }

    /// File name for a stored picture. All stored pictures are PNG-named.
    pub fn file_name(id: Uuid) -> String {
        format!("{id}.png")
    }

    /// Canonical path of a stored picture.
    pub fn file_path(&self, subfolder: &str, id: Uuid) -> PathBuf {
        self.folder(subfolder).join(Self::file_name(id))
    }

    /// Legacy path of a preview file, from before the per-variant layout.
    pub fn legacy_path(&self, id: Uuid) -> PathBuf {
        self.folder(LEGACY_FOLDER).join(Self::file_name(id))
    }

    /// Resolve the readable path of a preview variant.
    ///
    /// Falls back to the shared legacy folder when the canonical file does
    /// not exist. Returns `None` when neither location holds a file. The
    /// fallback applies to retrieval only; uploads always write canonically.
    pub fn resolve_preview(&self, subfolder: &str, id: Uuid) -> Option<PathBuf> {
        let canonical = self.file_path(subfolder, id);
        if canonical.exists() {
            return Some(canonical);
        }
        let legacy = self.legacy_path(id);
        legacy.exists().then_some(legacy)
    }
}
