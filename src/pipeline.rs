//! End-to-end processing of one upload.
//!
//! [`ContentPipeline`] fingerprints the upload, answers from the
//! [`ResultCache`] when it can, and otherwise selects key frames,
//! transcribes the audio, asks a [`TextGenerator`] for copy, and stores
//! the result.
//!
//! The frame source is opened lazily through a closure, so a cache hit never
//! decodes the video.

use std::sync::Arc;

use image::DynamicImage;

use crate::{
    brand::BrandContext,
    cache::{CacheEntry, ResultCache},
    configuration::ProcessingOptions,
    error::KeyReelError,
    fingerprint::Fingerprint,
    frame::{Frame, FrameSource},
    prompt::{ContentTone, build_prompt},
    selection::select,
    thumbnail::context_images,
    transcription::Transcriber,
};

/// A generative text service.
pub trait TextGenerator {
    /// Produce free-form text for `prompt`, optionally looking at `images`.
    fn generate(&self, prompt: &str, images: &[DynamicImage]) -> Result<String, KeyReelError>;
}

/// What to generate for an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Requested voice; also the cache variant.
    pub tone: ContentTone,
    /// Brand and campaign details.
    pub brand: BrandContext,
    /// Indices into the selected frames to show the generator. Empty means
    /// all of them.
    pub selected: Vec<usize>,
}

impl GenerationRequest {
    /// Request copy in `tone` with no brand context.
    pub fn new(tone: ContentTone) -> Self {
        Self {
            tone,
            ..Self::default()
        }
    }

    /// Attach brand and campaign details.
    #[must_use]
    pub fn with_brand(mut self, brand: BrandContext) -> Self {
        self.brand = brand;
        self
    }

    /// Restrict the frames shown to the generator.
    #[must_use]
    pub fn with_selected(mut self, indices: Vec<usize>) -> Self {
        self.selected = indices;
        self
    }
}

/// Result of [`ContentPipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Fingerprint of the upload.
    pub fingerprint: Fingerprint,
    /// Frames, transcript, and generated text.
    pub entry: Arc<CacheEntry>,
    /// `true` when the entry came from the cache.
    pub from_cache: bool,
}

/// Ties selection, transcription, generation, and caching together.
pub struct ContentPipeline<'a, T, G> {
    cache: &'a ResultCache,
    transcriber: T,
    generator: G,
    options: ProcessingOptions,
}

impl<'a, T: Transcriber, G: TextGenerator> ContentPipeline<'a, T, G> {
    /// Build a pipeline over a session's cache.
    pub fn new(
        cache: &'a ResultCache,
        transcriber: T,
        generator: G,
        options: ProcessingOptions,
    ) -> Self {
        Self {
            cache,
            transcriber,
            generator,
            options,
        }
    }

    /// The processing settings in effect.
    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Process `upload`.
    ///
    /// `open_source` is called only when the result is not cached.
    ///
    /// Transcription errors are logged and replaced by an empty transcript.
    /// Every other error propagates, and nothing is cached for a failed run.
    ///
    /// # Errors
    ///
    /// - Errors from `open_source` and from [`select`].
    /// - [`KeyReelError::InvalidConfiguration`] if `request.selected` names
    ///   a frame that was not selected.
    /// - Errors from the [`TextGenerator`].
    pub fn run<S, F>(
        &self,
        upload: &[u8],
        request: &GenerationRequest,
        open_source: F,
    ) -> Result<PipelineOutcome, KeyReelError>
    where
        S: FrameSource,
        F: FnOnce() -> Result<S, KeyReelError>,
    {
        let fingerprint = Fingerprint::of(upload);
        let variant = request.tone.label();

        if self.options.use_cache {
            if let Some(entry) = self.cache.lookup(&fingerprint, variant) {
                log::debug!("Using cached result for {fingerprint} ({variant})");
                return Ok(PipelineOutcome {
                    fingerprint,
                    entry,
                    from_cache: true,
                });
            }
        }

        log::debug!(
            "Processing upload {fingerprint} ({} bytes, policy={:?}, max_frames={})",
            upload.len(),
            self.options.policy,
            self.options.max_frames
        );
        let source = open_source()?;
        let frames = select(source, &self.options.policy, self.options.max_frames)?;

        let transcript = match self.transcriber.transcribe(upload) {
            Ok(text) => text,
            Err(error) => {
                log::warn!("Transcription failed, continuing with frames only: {error}");
                String::new()
            }
        };

        let shown = pick_frames(&frames, &request.selected)?;
        let prompt = build_prompt(&transcript, &request.brand.to_string(), request.tone);
        let generated_text = self.generator.generate(&prompt, &context_images(&shown))?;

        let entry = CacheEntry::new(frames, transcript, generated_text);
        if self.options.use_cache {
            self.cache
                .store(fingerprint.clone(), variant, entry.clone());
        }

        Ok(PipelineOutcome {
            fingerprint,
            entry: Arc::new(entry),
            from_cache: false,
        })
    }
}

fn pick_frames(frames: &[Frame], indices: &[usize]) -> Result<Vec<Frame>, KeyReelError> {
    if indices.is_empty() {
        return Ok(frames.to_vec());
    }
    indices
        .iter()
        .map(|&index| {
            frames.get(index).cloned().ok_or_else(|| {
                KeyReelError::InvalidConfiguration(format!(
                    "frame index {index} is out of range ({} frames selected)",
                    frames.len()
                ))
            })
        })
        .collect()
}
