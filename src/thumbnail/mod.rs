//! Thumbnail storage and variant generation.
//!
//! This module owns the on-disk layout of uploaded pictures, atomic
//! persistence, and the derived-variant workflow for preview files.

pub mod paths;
pub mod presets;
pub mod store;
pub mod variants;

pub use paths::{PathResolver, LEGACY_FOLDER};
pub use presets::{SizePreset, PREVIEW_WIDTH, RECTANGLE_SIZE, SQUARE_SIZE};
pub use store::ImageStore;
pub use variants::{generate_variants, VariantKind, DERIVED_VARIANTS};
