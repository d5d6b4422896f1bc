//! Decoded frames and the sources that produce them.
//!
//! A [`Frame`] pairs a decoded raster with its zero-based position in the
//! source sequence. A [`FrameSource`] is any forward-only iterator of frames
//! that also knows the container-reported frame count and frame rate. The
//! FFmpeg decoder is one such source; [`InMemoryFrames`] is another, used
//! when frames are already decoded.
//!
//! # Example
//!
//! ```
//! use image::DynamicImage;
//! use keyreel::{Frame, InMemoryFrames};
//!
//! let images = vec![DynamicImage::new_luma8(4, 4); 3];
//! let source = InMemoryFrames::from_images(images, 30.0);
//! let ordinals: Vec<u64> = source.map(|frame| frame.unwrap().ordinal()).collect();
//! assert_eq!(ordinals, vec![0, 1, 2]);
//! ```

use std::{sync::Arc, time::Duration, vec::IntoIter};

use image::DynamicImage;

use crate::error::KeyReelError;

/// An immutable decoded frame and its ordinal in the source.
///
/// Cloning is cheap: the raster is shared, never copied.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    ordinal: u64,
    image: Arc<DynamicImage>,
}

impl Frame {
    /// Wrap a decoded image at the given zero-based position.
    pub fn new(ordinal: u64, image: DynamicImage) -> Self {
        Self {
            ordinal,
            image: Arc::new(image),
        }
    }

    /// Zero-based position of this frame in its source.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The decoded raster.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Presentation time derived from the ordinal and the source frame rate.
    ///
    /// Returns [`Duration::ZERO`] when the frame rate is unknown (zero or
    /// negative).
    pub fn timestamp(&self, frames_per_second: f64) -> Duration {
        if frames_per_second <= 0.0 || !frames_per_second.is_finite() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.ordinal as f64 / frames_per_second)
    }
}

/// A forward-only sequence of decoded frames.
///
/// Items are yielded in ascending ordinal order. An `Err` item means the
/// frame could not be produced; consumers treat it as fatal.
pub trait FrameSource: Iterator<Item = Result<Frame, KeyReelError>> {
    /// Total number of frames as reported by the container.
    ///
    /// This is an estimate for real video files and may differ from the
    /// number of frames actually yielded.
    fn frame_count(&self) -> u64;

    /// Source frame rate, or `0.0` when unknown.
    fn frames_per_second(&self) -> f64;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn frames_per_second(&self) -> f64 {
        (**self).frames_per_second()
    }
}

/// A frame source over frames already held in memory.
#[derive(Debug)]
pub struct InMemoryFrames {
    frames: IntoIter<Frame>,
    frame_count: u64,
    frames_per_second: f64,
}

impl InMemoryFrames {
    /// Build a source from pre-numbered frames.
    ///
    /// The frame count reported to selectors is the vector's length.
    pub fn new(frames: Vec<Frame>, frames_per_second: f64) -> Self {
        let frame_count = frames.len() as u64;
        Self {
            frames: frames.into_iter(),
            frame_count,
            frames_per_second,
        }
    }

    /// Build a source from raw images, numbering them 0, 1, 2, …
    pub fn from_images(images: Vec<DynamicImage>, frames_per_second: f64) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(ordinal, image)| Frame::new(ordinal as u64, image))
            .collect();
        Self::new(frames, frames_per_second)
    }
}

impl Iterator for InMemoryFrames {
    type Item = Result<Frame, KeyReelError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

impl FrameSource for InMemoryFrames {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }
}
