//! Picture persistence on the content store.
//!
//! Writes go to a temp file next to the destination and are renamed into
//! place, so a concurrent reader never observes a half-written picture.
//! Re-uploads overwrite: last writer wins.

use std::fs;
use std::io::{self, Cursor};
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use uuid::Uuid;

use crate::error::{DailiesError, Result};
use crate::thumbnail::paths::PathResolver;
use crate::thumbnail::presets::SizePreset;

/// Content store for uploaded pictures and their derived variants.
#[derive(Debug, Clone)]
pub struct ImageStore {
    resolver: PathResolver,
}

impl ImageStore {
    /// Create a store rooted at the given directory.
    ///
    /// The root directory is created if it does not exist; subfolders are
    /// created lazily at save time.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let resolver = PathResolver::new(root);
        fs::create_dir_all(resolver.root())?;
        Ok(Self { resolver })
    }

    /// Path resolver backing this store.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Save uploaded bytes for an entity.
    ///
    /// With a preset, the bytes must decode as an image; the resized result
    /// is written as PNG. Without a preset the raw bytes are stored
    /// unmodified (the preview-file originals case).
    pub fn save(
        &self,
        subfolder: &str,
        id: Uuid,
        bytes: &[u8],
        preset: Option<SizePreset>,
    ) -> Result<PathBuf> {
        match preset {
            Some(preset) => {
                let img = image::load_from_memory(bytes).map_err(|e| {
                    DailiesError::InvalidUpload(format!("cannot decode uploaded image: {e}"))
                })?;
                self.save_image(subfolder, id, &preset.apply(&img))
            }
            None => self.write_atomic(subfolder, id, bytes),
        }
    }

    /// Save a decoded image as PNG.
    pub fn save_image(&self, subfolder: &str, id: Uuid, img: &DynamicImage) -> Result<PathBuf> {
        let mut encoded = Cursor::new(Vec::new());
        img.write_to(&mut encoded, ImageFormat::Png).map_err(|e| {
            DailiesError::InvalidUpload(format!("cannot encode image as PNG: {e}"))
        })?;
        self.write_atomic(subfolder, id, encoded.get_ref())
    }

    /// Load the stored bytes for an entity.
    pub fn load(&self, subfolder: &str, id: Uuid) -> Result<Vec<u8>> {
        let path = self.resolver.file_path(subfolder, id);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DailiesError::NotFound(format!(
                "File {subfolder}/{id}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a preview variant, falling back to the legacy shared folder.
    pub fn load_preview(&self, subfolder: &str, id: Uuid) -> Result<Vec<u8>> {
        let path = self
            .resolver
            .resolve_preview(subfolder, id)
            .ok_or_else(|| DailiesError::NotFound(format!("File {subfolder}/{id}")))?;
        Ok(fs::read(path)?)
    }

    /// Check whether a stored picture exists at its canonical path.
    pub fn exists(&self, subfolder: &str, id: Uuid) -> bool {
        self.resolver.file_path(subfolder, id).exists()
    }

    /// Write bytes to a temp file in the destination folder, then rename
    /// onto the canonical name.
    fn write_atomic(&self, subfolder: &str, id: Uuid, bytes: &[u8]) -> Result<PathBuf> {
        let folder = self.resolver.folder(subfolder);
        fs::create_dir_all(&folder)?;

        let final_path = self.resolver.file_path(subfolder, id);
        let tmp_path = folder.join(format!(
            "{}.{}.tmp",
            PathResolver::file_name(id),
            Uuid::new_v4()
        ));

        fs::write(&tmp_path, bytes)?;
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        Ok(final_path)
    }
}
