//! dailies - thumbnail and preview picture service for a production asset
//! tracker.
//!
//! Accepts uploaded pictures for tracker entities (persons, projects, shots,
//! assets, working files, preview files), stores them under a folder
//! convention, derives resized variants, and serves them back subject to
//! per-entity permission checks.

pub mod access;
pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod logging;
pub mod thumbnail;
pub mod web;

pub use access::{allowed, PictureAction};
pub use config::Config;
pub use directory::{EntityRecord, InMemoryDirectory, ProductionDirectory, TaskRecord};
pub use entity::EntityKind;
pub use error::{DailiesError, Result};
pub use thumbnail::{
    generate_variants, ImageStore, PathResolver, SizePreset, VariantKind,
};
