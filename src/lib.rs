//! # keyreel
//!
//! Pick the key frames of a video and remember what was generated from
//! them.
//!
//! `keyreel` selects a handful of representative frames from a decoded
//! video, either by sampling at a fixed stride or by ranking every frame by
//! how much it changed from the one before. Around that core it provides a
//! result cache keyed by content fingerprint and generation variant, a
//! polling transcription client, prompt templating for marketing copy, a
//! Gemini text generator, and an FFmpeg-backed decoder.
//!
//! ## Quick Start
//!
//! ### Select Key Frames
//!
//! ```no_run
//! # #[cfg(feature = "ffmpeg")]
//! # {
//! use keyreel::{DecodeOptions, SelectionPolicy, VideoDecoder, select};
//!
//! let decoder = VideoDecoder::open_tracked("input.mp4", &DecodeOptions::new()).unwrap();
//! let frames = select(decoder, &SelectionPolicy::ChangeRanked { sensitivity: 25 }, 8).unwrap();
//! keyreel::save_frames(&frames, "frames".as_ref(), "jpg").unwrap();
//! # }
//! ```
//!
//! ### Cache Results
//!
//! ```
//! use keyreel::{CacheEntry, ContentTone, Fingerprint, ResultCache};
//!
//! let cache = ResultCache::new();
//! let fingerprint = Fingerprint::of(b"uploaded bytes");
//! let tone = ContentTone::Humorous;
//!
//! if cache.lookup(&fingerprint, tone.label()).is_none() {
//!     let entry = CacheEntry::new(Vec::new(), String::new(), "caption".to_string());
//!     cache.store(fingerprint.clone(), tone.label(), entry);
//! }
//! assert_eq!(cache.len(), 1);
//! ```
//!
//! ## Features
//!
//! - **Fixed-stride sampling** that widens its stride on long videos
//! - **Change ranking** by mean absolute luma difference, streaming, with
//!   an opt-in minimum-magnitude gate
//! - **Result cache** with whole-cache invalidation and no eviction
//! - **Polling transcription** with separate failure and timeout errors
//! - **Copy generation** from a structured brand context, exported as JSON
//!   records
//! - **Progress & cancellation** through a frame source adapter
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | `VideoDecoder` and the `keyreel` CLI, via `ffmpeg-next` |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `ffmpeg` feature needs the FFmpeg development libraries installed
//! on the system.

pub mod assemblyai;
pub mod brand;
pub mod cache;
pub mod configuration;
#[cfg(feature = "ffmpeg")]
mod conversion;
pub mod error;
pub mod export;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod fingerprint;
pub mod frame;
pub mod gemini;
mod http;
#[cfg(feature = "ffmpeg")]
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod selection;
pub mod thumbnail;
pub mod transcription;
#[cfg(feature = "ffmpeg")]
pub mod video;

pub use assemblyai::AssemblyAiClient;
pub use brand::BrandContext;
pub use cache::{CacheEntry, CacheKey, ResultCache};
pub use configuration::{DecodeOptions, FrameOutputOptions, PixelFormat, ProcessingOptions};
pub use error::KeyReelError;
pub use export::{ContentRecord, save_frames};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use fingerprint::Fingerprint;
pub use frame::{Frame, FrameSource, InMemoryFrames};
pub use gemini::GeminiClient;
#[cfg(feature = "ffmpeg")]
pub use metadata::VideoMetadata;
pub use pipeline::{ContentPipeline, GenerationRequest, PipelineOutcome, TextGenerator};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo, TrackedSource};
pub use prompt::{ContentTone, build_prompt};
pub use selection::{
    ChangeScore, SelectionPolicy, change_scores, mean_absolute_difference, select, top_changes,
};
pub use transcription::{
    Clock, ManualClock, PollOptions, PollingTranscriber, SystemClock, Transcriber,
    TranscriptStatus, TranscriptionService,
};
#[cfg(feature = "ffmpeg")]
pub use video::VideoDecoder;
