//! Derived variant generation for preview files.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DailiesError, Result};
use crate::thumbnail::presets::SizePreset;
use crate::thumbnail::store::ImageStore;

/// Variants a stored preview-file picture can exist as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// The unmodified uploaded picture.
    Original,
    /// Rectangle thumbnail.
    Thumbnail,
    /// Square thumbnail.
    ThumbnailSquare,
    /// Display-resolution copy.
    Preview,
}

impl VariantKind {
    /// Subfolder of the content store holding this variant.
    pub fn subfolder(&self) -> &'static str {
        match self {
            VariantKind::Original => "originals",
            VariantKind::Thumbnail => "thumbnails",
            VariantKind::ThumbnailSquare => "thumbnails-square",
            VariantKind::Preview => "previews",
        }
    }

    /// Preset used to derive this variant from an original.
    pub fn preset(&self) -> Option<SizePreset> {
        match self {
            VariantKind::Original => None,
            VariantKind::Thumbnail => Some(SizePreset::Rectangle),
            VariantKind::ThumbnailSquare => Some(SizePreset::Square),
            VariantKind::Preview => Some(SizePreset::Preview),
        }
    }
}

/// The three variants derived from every preview-file original.
pub const DERIVED_VARIANTS: [VariantKind; 3] = [
    VariantKind::Thumbnail,
    VariantKind::ThumbnailSquare,
    VariantKind::Preview,
];

/// Derive and persist all variants for a previously stored original.
///
/// The original is decoded once; if the stored bytes are not a valid image
/// the call fails with `InvalidUpload` before any variant is written, and
/// the original stays untouched either way.
pub fn generate_variants(store: &ImageStore, id: Uuid) -> Result<()> {
    let original = store.load(VariantKind::Original.subfolder(), id)?;
    let img = image::load_from_memory(&original).map_err(|e| {
        DailiesError::InvalidUpload(format!("original does not decode as an image: {e}"))
    })?;

    for variant in DERIVED_VARIANTS {
        // preset() is always Some for derived variants
        let preset = variant.preset().unwrap_or(SizePreset::Preview);
        let resized = preset.apply(&img);
        store.save_image(variant.subfolder(), id, &resized)?;
        tracing::debug!(preview_file = %id, variant = ?variant, "generated preview variant");
    }

    Ok(())
}
