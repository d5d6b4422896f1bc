//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring long-running
//! work, [`CancellationToken`] for cooperative cancellation, and
//! [`TrackedSource`], a [`FrameSource`] adapter that applies both to any
//! frame source.
//!
//! Selection itself never checks for cancellation. Wrapping the source is
//! how a caller bounds it: a cancelled [`TrackedSource`] yields
//! [`KeyReelError::Cancelled`], which aborts the selection like any other
//! source error.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use image::DynamicImage;
//! use keyreel::{
//!     CancellationToken, DecodeOptions, InMemoryFrames, KeyReelError, SelectionPolicy,
//!     TrackedSource, select,
//! };
//!
//! let token = CancellationToken::new();
//! let options = DecodeOptions::new().with_cancellation(token.clone());
//! let source = InMemoryFrames::from_images(vec![DynamicImage::new_luma8(2, 2); 4], 30.0);
//!
//! token.cancel();
//! let result = select(
//!     TrackedSource::new(source, &options),
//!     &SelectionPolicy::FixedStride { interval: 1 },
//!     4,
//! );
//! assert!(matches!(result, Err(KeyReelError::Cancelled)));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::{
    configuration::DecodeOptions,
    error::KeyReelError,
    frame::{Frame, FrameSource},
};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding frames from a source.
    FrameDecoding,
    /// Waiting for a transcription job to finish.
    TranscriptionPolling,
}

/// A snapshot of progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`DecodeOptions::with_batch_size`].
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (frames / polls) have been processed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The frame ordinal currently being processed (decoding only).
    pub current_frame: Option<u64>,
    /// The timestamp currently being processed.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] so a single callback can
/// be shared between sessions.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated source at its next frame.
///
/// # Example
///
/// ```
/// use keyreel::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, frame_number: Option<u64>, timestamp: Option<Duration>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_number, timestamp);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report(None, None);
    }

    fn report(&self, frame_number: Option<u64>, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32 * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_number,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}

/// A [`FrameSource`] adapter that reports progress and honours
/// cancellation.
///
/// Cancellation is checked before every frame. Once cancelled, or once the
/// inner source has failed or finished, the adapter yields nothing more.
pub struct TrackedSource<S> {
    inner: S,
    tracker: ProgressTracker,
    cancellation: Option<CancellationToken>,
    frames_per_second: f64,
    done: bool,
}

impl<S: FrameSource> TrackedSource<S> {
    /// Wrap `inner` with the progress and cancellation settings of
    /// `options`.
    pub fn new(inner: S, options: &DecodeOptions) -> Self {
        let total = Some(inner.frame_count()).filter(|&count| count > 0);
        let frames_per_second = inner.frames_per_second();
        Self {
            tracker: ProgressTracker::new(
                Arc::clone(&options.progress),
                OperationType::FrameDecoding,
                total,
                options.batch_size,
            ),
            cancellation: options.cancellation.clone(),
            frames_per_second,
            inner,
            done: false,
        }
    }

    /// Consume the adapter and return the wrapped source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSource> Iterator for TrackedSource<S> {
    type Item = Result<Frame, KeyReelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            self.done = true;
            return Some(Err(KeyReelError::Cancelled));
        }

        match self.inner.next() {
            Some(Ok(frame)) => {
                let timestamp = frame.timestamp(self.frames_per_second);
                self.tracker.advance(Some(frame.ordinal()), Some(timestamp));
                Some(Ok(frame))
            }
            Some(Err(error)) => {
                self.done = true;
                Some(Err(error))
            }
            None => {
                self.done = true;
                self.tracker.finish();
                None
            }
        }
    }
}

impl<S: FrameSource> FrameSource for TrackedSource<S> {
    fn frame_count(&self) -> u64 {
        self.inner.frame_count()
    }

    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }
}
