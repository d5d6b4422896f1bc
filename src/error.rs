//! Error types for the `keyreel` crate.
//!
//! This module defines [`KeyReelError`], the unified error type returned by
//! all fallible operations in the crate. Selection errors are deliberately
//! few: an empty source, a decode failure, or a bad configuration. The
//! remaining variants belong to the collaborators around the selector
//! (decoder, transcription, generation).

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `keyreel` operations.
///
/// Every public method that can fail returns `Result<T, KeyReelError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeyReelError {
    /// The frame source produced no frames at all.
    #[error("Frame source is empty")]
    EmptySource,

    /// A frame could not be read or decoded. Fatal to the current selection.
    #[error("Failed to decode frame: {0}")]
    DecodeFailure(String),

    /// A caller-supplied parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the decoder.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while converting or saving frames.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A request to the transcription service failed before a job finished.
    #[error("Transcription request failed: {0}")]
    TranscriptionRequest(String),

    /// The transcription service reported the job as failed.
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The transcription job did not finish before the polling deadline.
    #[error("Transcription timed out after {0:?}")]
    TranscriptionTimedOut(Duration),

    /// The generative text service returned an error.
    #[error("Text generation failed: {0}")]
    Generation(String),

    /// A result record could not be serialised.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for KeyReelError {
    fn from(error: ffmpeg_next::Error) -> Self {
        KeyReelError::Ffmpeg(error.to_string())
    }
}

impl From<reqwest::Error> for KeyReelError {
    fn from(error: reqwest::Error) -> Self {
        KeyReelError::TranscriptionRequest(error.to_string())
    }
}
