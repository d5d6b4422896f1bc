//! Downscaling helpers for frames sent to the generative service.
//!
//! Context images are capped on their longest edge so requests stay small;
//! aspect ratio is always preserved.

use image::{DynamicImage, imageops::FilterType};

use crate::frame::Frame;

/// Longest edge, in pixels, of images attached to a generation request.
pub const CONTEXT_MAX_DIMENSION: u32 = 500;

/// Maximum number of frames attached to a generation request.
pub const CONTEXT_MAX_IMAGES: usize = 3;

/// Compute dimensions that fit within `max_dimension` preserving aspect ratio.
///
/// Images already inside the bound keep their size.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_dimension, max_dimension);
    }
    if width.max(height) <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / width.max(height) as f64;
    let new_width = ((width as f64) * scale).round() as u32;
    let new_height = ((height as f64) * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}

/// Scale `image` down to fit within `max_dimension` on its longest edge.
pub fn thumbnail(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = fit_dimensions(image.width(), image.height(), max_dimension);
    if (width, height) == (image.width(), image.height()) {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Thumbnails of the first [`CONTEXT_MAX_IMAGES`] frames, ready to attach
/// to a generation request.
pub fn context_images(frames: &[Frame]) -> Vec<DynamicImage> {
    frames
        .iter()
        .take(CONTEXT_MAX_IMAGES)
        .map(|frame| thumbnail(frame.image(), CONTEXT_MAX_DIMENSION))
        .collect()
}
