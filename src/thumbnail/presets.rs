//! Resize presets applied to uploaded pictures.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Rectangle thumbnail dimensions (width, height).
pub const RECTANGLE_SIZE: (u32, u32) = (150, 100);

/// Square thumbnail dimensions (width, height).
pub const SQUARE_SIZE: (u32, u32) = (100, 100);

/// Maximum width of a display-resolution preview.
pub const PREVIEW_WIDTH: u32 = 1200;

/// Named target dimensions applied when a picture is stored or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreset {
    /// 150x100, cover-resized and center-cropped.
    Rectangle,
    /// 100x100, cover-resized and center-cropped.
    Square,
    /// Width capped at 1200, aspect preserved, never upscaled.
    Preview,
}

impl SizePreset {
    /// Apply the preset to a decoded image.
    pub fn apply(&self, img: &DynamicImage) -> DynamicImage {
        match self {
            SizePreset::Rectangle => {
                let (w, h) = RECTANGLE_SIZE;
                img.resize_to_fill(w, h, FilterType::Lanczos3)
            }
            SizePreset::Square => {
                let (w, h) = SQUARE_SIZE;
                img.resize_to_fill(w, h, FilterType::Lanczos3)
            }
            SizePreset::Preview => {
                let (w, h) = img.dimensions();
                if w <= PREVIEW_WIDTH {
                    return img.clone();
                }
                // Shrink to the preview width, keeping the aspect ratio.
                let target_h = ((h as u64 * PREVIEW_WIDTH as u64) / w as u64).max(1) as u32;
                img.resize_exact(PREVIEW_WIDTH, target_h, FilterType::Lanczos3)
            }
        }
    }
}
