//! FFmpeg-backed sequential frame source.
//!
//! [`VideoDecoder`] opens a media file, picks its best video stream, and
//! yields every decoded frame in order as a [`Frame`] numbered 0, 1, 2, …
//! It never seeks, which is all the selector needs.
//!
//! This module is available when the `ffmpeg` feature is enabled.
//!
//! # Example
//!
//! ```no_run
//! use keyreel::{DecodeOptions, KeyReelError, SelectionPolicy, VideoDecoder, select};
//!
//! let decoder = VideoDecoder::open_tracked("input.mp4", &DecodeOptions::new())?;
//! let frames = select(decoder, &SelectionPolicy::FixedStride { interval: 30 }, 8)?;
//! for frame in &frames {
//!     frame.image().save(format!("frame_{}.png", frame.ordinal()))?;
//! }
//! # Ok::<(), KeyReelError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as FfmpegVideoDecoder,
    error::EAGAIN,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    configuration::{DecodeOptions, FrameOutputOptions, PixelFormat},
    conversion::{frame_to_buffer, rational_to_fps},
    error::KeyReelError,
    frame::{Frame, FrameSource},
    metadata::VideoMetadata,
    progress::TrackedSource,
};

/// Forward-only decoder over a file's best video stream.
///
/// Errors are fatal: after yielding an `Err` the decoder yields nothing more.
pub struct VideoDecoder {
    input_context: Input,
    decoder: FfmpegVideoDecoder,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    metadata: VideoMetadata,
    frame_output: FrameOutputOptions,
    target_width: u32,
    target_height: u32,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    next_ordinal: u64,
    eof_sent: bool,
    done: bool,
    file_path: PathBuf,
}

impl Debug for VideoDecoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoDecoder")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("next_ordinal", &self.next_ordinal)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoDecoder {
    /// Open `path` for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and reads its metadata. Output pixel format and
    /// resolution come from `options`; progress and cancellation do not
    /// apply until the decoder is wrapped in a [`TrackedSource`] (see
    /// [`open_tracked`](VideoDecoder::open_tracked)).
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::FileOpen`] if the file cannot be opened or
    /// its codec is unsupported, or [`KeyReelError::NoVideoStream`] if it
    /// has no video.
    pub fn open<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self, KeyReelError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let open_error = |reason: String| KeyReelError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening video for decoding: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(KeyReelError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("Failed to read video codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = rational_to_fps(stream.avg_frame_rate())
            .or_else(|| rational_to_fps(stream.rate()))
            .unwrap_or(0.0);

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            format: input_context.format().name().to_string(),
        };

        let frame_output = options.frame_output().clone();
        let (target_width, target_height) =
            frame_output.resolve_dimensions(metadata.width, metadata.height);

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, ~{} frames, codec {}",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            metadata,
            frame_output,
            target_width,
            target_height,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            next_ordinal: 0,
            eof_sent: false,
            done: false,
            file_path,
        })
    }

    /// Open `path` and wrap the decoder with the progress and cancellation
    /// settings of `options`.
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoDecoder::open).
    pub fn open_tracked<P: AsRef<Path>>(
        path: P,
        options: &DecodeOptions,
    ) -> Result<TrackedSource<Self>, KeyReelError> {
        let decoder = Self::open(path, options)?;
        Ok(TrackedSource::new(decoder, options))
    }

    /// Metadata of the decoded stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Scale and convert the current `decoded_frame` to a `DynamicImage`.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, KeyReelError> {
        if self.scaler.is_none() {
            // Built from the first decoded frame; the decoder's advertised
            // format can differ from what it actually outputs.
            self.scaler = Some(ScalingContext::get(
                self.decoded_frame.format(),
                self.decoded_frame.width(),
                self.decoded_frame.height(),
                self.frame_output.pixel_format.to_ffmpeg_pixel(),
                self.target_width,
                self.target_height,
                ScalingFlags::BILINEAR,
            )?);
        }
        if let Some(scaler) = self.scaler.as_mut() {
            scaler
                .run(&self.decoded_frame, &mut self.scaled_frame)
                .map_err(|error| KeyReelError::DecodeFailure(format!("scaling failed: {error}")))?;
        }

        let width = self.target_width;
        let height = self.target_height;
        let pixel_format = self.frame_output.pixel_format;
        let buffer = frame_to_buffer(
            &self.scaled_frame,
            width,
            height,
            pixel_format.bytes_per_pixel(),
        );
        let mismatch = || {
            KeyReelError::DecodeFailure(format!(
                "decoded buffer does not match {width}x{height} {pixel_format:?}"
            ))
        };

        match pixel_format {
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch),
            PixelFormat::Rgba8 => RgbaImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch),
            PixelFormat::Gray8 => GrayImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
        }
    }

    fn fail(&mut self, error: KeyReelError) -> Option<Result<Frame, KeyReelError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for VideoDecoder {
    type Item = Result<Frame, KeyReelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match receive_step(self.decoder.receive_frame(&mut self.decoded_frame)) {
                ReceiveStep::Frame => {
                    let ordinal = self.next_ordinal;
                    self.next_ordinal += 1;
                    return match self.convert_current_frame() {
                        Ok(image) => Some(Ok(Frame::new(ordinal, image))),
                        Err(error) => self.fail(error),
                    };
                }
                ReceiveStep::Drained => {
                    self.done = true;
                    return None;
                }
                ReceiveStep::Failed(error) => {
                    let ordinal = self.next_ordinal;
                    return self.fail(KeyReelError::DecodeFailure(format!(
                        "frame {ordinal} could not be decoded: {error}"
                    )));
                }
                ReceiveStep::NeedInput if self.eof_sent => {
                    self.done = true;
                    return None;
                }
                ReceiveStep::NeedInput => {}
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        let ordinal = self.next_ordinal;
                        return self.fail(KeyReelError::DecodeFailure(format!(
                            "packet rejected near frame {ordinal}: {error}"
                        )));
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        return self.fail(KeyReelError::DecodeFailure(format!(
                            "failed to flush decoder: {error}"
                        )));
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    let ordinal = self.next_ordinal;
                    return self.fail(KeyReelError::DecodeFailure(format!(
                        "read error near frame {ordinal}: {error}"
                    )));
                }
            }
        }
    }
}

/// What the decoder's answer to `receive_frame` means for the read loop.
#[derive(Debug, PartialEq)]
enum ReceiveStep {
    /// A frame is ready in `decoded_frame`.
    Frame,
    /// The decoder wants another packet.
    NeedInput,
    /// The decoder has been flushed and holds nothing more.
    Drained,
    /// Decoding failed; the frame is lost.
    Failed(FfmpegError),
}

fn receive_step(result: Result<(), FfmpegError>) -> ReceiveStep {
    match result {
        Ok(()) => ReceiveStep::Frame,
        Err(FfmpegError::Other { errno }) if errno == EAGAIN => ReceiveStep::NeedInput,
        Err(FfmpegError::Eof) => ReceiveStep::Drained,
        Err(error) => ReceiveStep::Failed(error),
    }
}

impl FrameSource for VideoDecoder {
    fn frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn frames_per_second(&self) -> f64 {
        self.metadata.frames_per_second
    }
}
