//! Key-frame selection.
//!
//! Picks at most `max_count` frames from a [`FrameSource`] using one of the
//! [`SelectionPolicy`] variants:
//!
//! - [`FixedStride`](SelectionPolicy::FixedStride) samples every Nth frame,
//!   widening the stride on long sources so the samples cover the whole
//!   video.
//! - [`ChangeRanked`](SelectionPolicy::ChangeRanked) scores every frame by
//!   the mean absolute luma difference from its predecessor and keeps the
//!   highest-scoring frames, returned in chronological order.
//! - [`ChangeGated`](SelectionPolicy::ChangeGated) ranks the same way but
//!   ignores frames whose score falls below a minimum magnitude.
//!
//! Selection is pure: it reads the source once, front to back, and performs
//! no I/O of its own. Any error from the source aborts the call.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, GrayImage, Luma};
//! use keyreel::{InMemoryFrames, SelectionPolicy, select};
//!
//! let images: Vec<DynamicImage> = [0u8, 2, 11, 10, 17]
//!     .iter()
//!     .map(|&value| DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([value]))))
//!     .collect();
//!
//! let source = InMemoryFrames::from_images(images, 25.0);
//! let frames = select(source, &SelectionPolicy::ChangeRanked { sensitivity: 25 }, 2)?;
//! let ordinals: Vec<u64> = frames.iter().map(|frame| frame.ordinal()).collect();
//! assert_eq!(ordinals, vec![2, 4]);
//! # Ok::<(), keyreel::KeyReelError>(())
//! ```

use std::cmp::Ordering;

use image::GrayImage;

use crate::{
    error::KeyReelError,
    frame::{Frame, FrameSource},
};

/// Default sampling stride, in frames, for [`SelectionPolicy::FixedStride`].
pub const DEFAULT_INTERVAL: u64 = 30;

/// Default advisory sensitivity for [`SelectionPolicy::ChangeRanked`].
pub const DEFAULT_SENSITIVITY: u32 = 25;

/// Default maximum number of selected frames.
pub const DEFAULT_MAX_FRAMES: usize = 8;

/// How frames are chosen from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Take every frame whose ordinal is a multiple of `interval`.
    ///
    /// When the source holds more than `max_count × interval` frames the
    /// interval is widened to `frame_count ÷ max_count`.
    FixedStride {
        /// Sampling stride in frames. Must be at least 1.
        interval: u64,
    },
    /// Rank frames by change magnitude and keep the top `max_count`.
    ChangeRanked {
        /// Carried for display only; it does not affect the ranking.
        sensitivity: u32,
    },
    /// Like `ChangeRanked`, but frames scoring below `min_magnitude` are
    /// never selected.
    ChangeGated {
        /// Minimum mean absolute luma difference (0.0–255.0).
        min_magnitude: f64,
    },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::ChangeRanked {
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl SelectionPolicy {
    /// Check the policy parameters together with `max_count`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::InvalidConfiguration`] when `max_count` is
    /// zero, the stride interval is zero, or the gate threshold is negative
    /// or not finite.
    pub fn validate(&self, max_count: usize) -> Result<(), KeyReelError> {
        if max_count < 1 {
            return Err(KeyReelError::InvalidConfiguration(
                "maximum frame count must be at least 1".to_string(),
            ));
        }
        match *self {
            SelectionPolicy::FixedStride { interval } if interval < 1 => {
                Err(KeyReelError::InvalidConfiguration(
                    "frame interval must be at least 1".to_string(),
                ))
            }
            SelectionPolicy::ChangeGated { min_magnitude }
                if !min_magnitude.is_finite() || min_magnitude < 0.0 =>
            {
                Err(KeyReelError::InvalidConfiguration(format!(
                    "minimum change magnitude must be a non-negative number, got {min_magnitude}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// The change magnitude between a frame and its immediate predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeScore {
    /// Ordinal of the later frame of the pair.
    pub ordinal: u64,
    /// Mean absolute per-pixel luma difference, 0.0–255.0.
    pub magnitude: f64,
}

/// Select at most `max_count` frames from `source`.
///
/// The result is ordinal-ascending and contains no duplicates.
///
/// # Errors
///
/// - [`KeyReelError::InvalidConfiguration`] if the parameters are invalid
///   (checked before the source is read).
/// - [`KeyReelError::EmptySource`] if the source yields no frames.
/// - [`KeyReelError::DecodeFailure`] if consecutive frames differ in size or
///   arrive out of order.
/// - Any error yielded by the source itself, unchanged.
pub fn select<S: FrameSource>(
    source: S,
    policy: &SelectionPolicy,
    max_count: usize,
) -> Result<Vec<Frame>, KeyReelError> {
    policy.validate(max_count)?;

    match *policy {
        SelectionPolicy::FixedStride { interval } => fixed_stride(source, interval, max_count),
        SelectionPolicy::ChangeRanked { .. } => change_ranked(source, max_count, None),
        SelectionPolicy::ChangeGated { min_magnitude } => {
            change_ranked(source, max_count, Some(min_magnitude))
        }
    }
}

/// Compute the change score of every frame that has a predecessor.
///
/// The first frame has no score, so a source of `n` frames yields `n - 1`
/// scores.
///
/// # Errors
///
/// Same as [`select`], minus configuration errors.
pub fn change_scores<S: FrameSource>(source: S) -> Result<Vec<ChangeScore>, KeyReelError> {
    let mut scores = Vec::new();
    let mut previous: Option<(u64, GrayImage)> = None;

    for item in source {
        let frame = item?;
        let luma = frame.image().to_luma8();
        if let Some((previous_ordinal, previous_luma)) = &previous {
            ensure_ascending(*previous_ordinal, frame.ordinal())?;
            scores.push(ChangeScore {
                ordinal: frame.ordinal(),
                magnitude: mean_absolute_difference(previous_luma, &luma)?,
            });
        }
        previous = Some((frame.ordinal(), luma));
    }

    if previous.is_none() {
        return Err(KeyReelError::EmptySource);
    }
    Ok(scores)
}

/// Keep the `max_count` largest scores, returned in ordinal order.
///
/// Equal magnitudes keep the earlier ordinal. Scores are expected in
/// ascending ordinal order, as produced by [`change_scores`].
pub fn top_changes(scores: &[ChangeScore], max_count: usize) -> Vec<ChangeScore> {
    let mut ranked: Vec<(ChangeScore, ())> = Vec::with_capacity(max_count.min(64) + 1);
    for score in scores {
        retain_top(&mut ranked, *score, (), max_count);
    }
    let mut top: Vec<ChangeScore> = ranked.into_iter().map(|(score, ())| score).collect();
    top.sort_by_key(|score| score.ordinal);
    top
}

/// Mean absolute per-pixel difference between two luma planes.
///
/// # Errors
///
/// Returns [`KeyReelError::DecodeFailure`] if the planes differ in size.
pub fn mean_absolute_difference(a: &GrayImage, b: &GrayImage) -> Result<f64, KeyReelError> {
    if a.dimensions() != b.dimensions() {
        return Err(KeyReelError::DecodeFailure(format!(
            "frame size changed from {}x{} to {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }

    let pixels = a.as_raw();
    if pixels.is_empty() {
        return Ok(0.0);
    }

    let total: u64 = pixels
        .iter()
        .zip(b.as_raw())
        .map(|(&left, &right)| u64::from(left.abs_diff(right)))
        .sum();
    Ok(total as f64 / pixels.len() as f64)
}

fn fixed_stride<S: FrameSource>(
    source: S,
    interval: u64,
    max_count: usize,
) -> Result<Vec<Frame>, KeyReelError> {
    let frame_count = source.frame_count();
    let max = max_count as u64;

    // Widen the stride so `max_count` samples span the whole source.
    let interval = if frame_count > max.saturating_mul(interval) {
        frame_count / max
    } else {
        interval
    };

    let mut selected = Vec::with_capacity(max_count.min(64));
    let mut last_ordinal: Option<u64> = None;

    for item in source {
        let frame = item?;
        if let Some(previous) = last_ordinal {
            ensure_ascending(previous, frame.ordinal())?;
        }
        last_ordinal = Some(frame.ordinal());

        if frame.ordinal() % interval == 0 {
            selected.push(frame);
            if selected.len() >= max_count {
                break;
            }
        }
    }

    if last_ordinal.is_none() {
        return Err(KeyReelError::EmptySource);
    }
    Ok(selected)
}

fn change_ranked<S: FrameSource>(
    source: S,
    max_count: usize,
    min_magnitude: Option<f64>,
) -> Result<Vec<Frame>, KeyReelError> {
    // Only the previous luma plane and the current top candidates are held.
    let mut previous: Option<(u64, GrayImage)> = None;
    let mut candidates: Vec<(ChangeScore, Frame)> = Vec::with_capacity(max_count.min(64) + 1);

    for item in source {
        let frame = item?;
        let ordinal = frame.ordinal();
        let luma = frame.image().to_luma8();

        if let Some((previous_ordinal, previous_luma)) = &previous {
            ensure_ascending(*previous_ordinal, ordinal)?;
            let magnitude = mean_absolute_difference(previous_luma, &luma)?;
            if min_magnitude.is_none_or(|threshold| magnitude >= threshold) {
                retain_top(
                    &mut candidates,
                    ChangeScore { ordinal, magnitude },
                    frame,
                    max_count,
                );
            }
        }
        previous = Some((ordinal, luma));
    }

    if previous.is_none() {
        return Err(KeyReelError::EmptySource);
    }

    candidates.sort_by_key(|(score, _)| score.ordinal);
    Ok(candidates.into_iter().map(|(_, frame)| frame).collect())
}

/// Insert `score` into `ranked` (magnitude descending) and cap its length.
///
/// `score` must have a larger ordinal than every entry already present, so
/// placing it after all entries of equal magnitude keeps earlier ordinals
/// ahead on ties.
fn retain_top<T>(ranked: &mut Vec<(ChangeScore, T)>, score: ChangeScore, item: T, max_count: usize) {
    let position = ranked.partition_point(|(existing, _)| {
        existing.magnitude.total_cmp(&score.magnitude) != Ordering::Less
    });
    if position >= max_count {
        return;
    }
    ranked.insert(position, (score, item));
    ranked.truncate(max_count);
}

fn ensure_ascending(previous: u64, current: u64) -> Result<(), KeyReelError> {
    if current <= previous {
        return Err(KeyReelError::DecodeFailure(format!(
            "frame {current} arrived after frame {previous}"
        )));
    }
    Ok(())
}
