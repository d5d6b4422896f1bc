//! Writing results to disk: selected frames as images, generated copy as
//! a JSON record.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use image::ImageFormat;
use serde::Serialize;

use crate::{
    error::KeyReelError,
    frame::Frame,
    pipeline::{GenerationRequest, PipelineOutcome},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Save `frames` into `directory` as `frame_<ordinal>.<extension>`.
///
/// The directory is created if missing. The image format follows the
/// extension (`png`, `jpg`/`jpeg`, `bmp`, `tiff`, …). Returns the written
/// paths in the order of `frames`.
///
/// # Errors
///
/// Returns [`KeyReelError::InvalidConfiguration`] for an unrecognised
/// extension, [`KeyReelError::Io`] if the directory cannot be created, or
/// [`KeyReelError::Image`] if encoding fails.
pub fn save_frames(
    frames: &[Frame],
    directory: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, KeyReelError> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let format = ImageFormat::from_extension(&extension).ok_or_else(|| {
        KeyReelError::InvalidConfiguration(format!("unsupported image extension: {extension}"))
    })?;

    fs::create_dir_all(directory)?;
    log::debug!(
        "Saving {} frames to {} as {:?}",
        frames.len(),
        directory.display(),
        format
    );

    let mut paths = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = directory.join(format!("frame_{}.{extension}", frame.ordinal()));
        // JPEG has no alpha channel.
        if format == ImageFormat::Jpeg {
            frame
                .image()
                .to_rgb8()
                .save_with_format(&path, format)?;
        } else {
            frame.image().save_with_format(&path, format)?;
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Downloadable summary of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRecord {
    pub brand: String,
    pub campaign: String,
    pub content_category: String,
    pub content_tone: String,
    /// Local time the record was made, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The generated copy.
    pub content: String,
    /// Fingerprint of the upload the copy was generated from.
    pub fingerprint: String,
    pub from_cache: bool,
}

impl ContentRecord {
    /// Summarise `outcome`, stamped with the current local time.
    pub fn new(outcome: &PipelineOutcome, request: &GenerationRequest) -> Self {
        Self::at(outcome, request, Local::now().naive_local())
    }

    /// Summarise `outcome` with an explicit timestamp.
    pub fn at(
        outcome: &PipelineOutcome,
        request: &GenerationRequest,
        timestamp: NaiveDateTime,
    ) -> Self {
        let brand = &request.brand;
        Self {
            brand: brand.brand_or_default().to_string(),
            campaign: brand.campaign_or_default().to_string(),
            content_category: brand.category_or_default().to_string(),
            content_tone: request.tone.label().to_string(),
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            content: outcome.entry.generated_text().to_string(),
            fingerprint: outcome.fingerprint.to_string(),
            from_cache: outcome.from_cache,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, KeyReelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON form to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), KeyReelError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        log::debug!("Wrote content record to {}", path.display());
        Ok(())
    }
}
