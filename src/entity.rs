//! Entity kinds tracked by the picture service.

use serde::{Deserialize, Serialize};

/// Kind of domain entity a picture can be attached to.
///
/// The kind determines the storage subfolder and which access rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    PreviewFile,
    Person,
    Project,
    Shot,
    Asset,
    WorkingFile,
}

impl EntityKind {
    /// Subfolder of the content store holding this kind's thumbnails.
    ///
    /// Preview files do not use this folder directly; their variants live
    /// under per-variant subfolders instead.
    pub fn subfolder(&self) -> &'static str {
        match self {
            EntityKind::PreviewFile => "preview-files",
            EntityKind::Person => "persons",
            EntityKind::Project => "projects",
            EntityKind::Shot => "shots",
            EntityKind::Asset => "assets",
            EntityKind::WorkingFile => "working_files",
        }
    }

    /// URL path segment for this kind's routes.
    pub fn route_segment(&self) -> &'static str {
        match self {
            EntityKind::PreviewFile => "preview-files",
            EntityKind::Person => "persons",
            EntityKind::Project => "projects",
            EntityKind::Shot => "shots",
            EntityKind::Asset => "assets",
            EntityKind::WorkingFile => "working-files",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::PreviewFile => "Preview file",
            EntityKind::Person => "Person",
            EntityKind::Project => "Project",
            EntityKind::Shot => "Shot",
            EntityKind::Asset => "Asset",
            EntityKind::WorkingFile => "Working file",
        }
    }
}
