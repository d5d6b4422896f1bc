//! Video stream metadata.
//!
//! Read once when a [`VideoDecoder`](crate::VideoDecoder) opens a file and
//! cached for the decoder's lifetime.

use std::time::Duration;

/// Metadata for the decoded video stream.
///
/// Includes dimensions, frame rate, estimated frame count, and codec name.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames: the container's count when it records one,
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Total duration of the container.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}
