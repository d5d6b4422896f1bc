//! DecodeOptions, FrameOutputOptions, PixelFormat, and ProcessingOptions tests.

use keyreel::{
    CancellationToken, DecodeOptions, FrameOutputOptions, PixelFormat, ProcessingOptions,
    SelectionPolicy,
};

// ── DecodeOptions builder ────────────────────────────────────────

#[test]
fn decode_options_defaults() {
    let options = DecodeOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("DecodeOptions"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
    assert_eq!(options.frame_output().pixel_format, PixelFormat::Rgb8);
}

#[test]
fn decode_options_with_batch_size_clamps_zero() {
    let debug = format!("{:?}", DecodeOptions::new().with_batch_size(0));
    assert!(debug.contains("batch_size: 1"));

    let debug = format!("{:?}", DecodeOptions::new().with_batch_size(25));
    assert!(debug.contains("batch_size: 25"));
}

#[test]
fn decode_options_with_cancellation() {
    let options = DecodeOptions::new().with_cancellation(CancellationToken::new());
    assert!(format!("{options:?}").contains("has_cancellation: true"));
}

#[test]
fn decode_options_output_settings() {
    let options = DecodeOptions::new()
        .with_pixel_format(PixelFormat::Gray8)
        .with_resolution(Some(320), None)
        .with_maintain_aspect_ratio(false);

    let output = options.frame_output();
    assert_eq!(output.pixel_format, PixelFormat::Gray8);
    assert_eq!(output.width, Some(320));
    assert_eq!(output.height, None);
    assert!(!output.maintain_aspect_ratio);
}

// ── PixelFormat ──────────────────────────────────────────────────

#[test]
fn pixel_format_sizes() {
    assert_eq!(PixelFormat::default(), PixelFormat::Rgb8);
    assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 3);
    assert_eq!(PixelFormat::Rgba8.bytes_per_pixel(), 4);
    assert_eq!(PixelFormat::Gray8.bytes_per_pixel(), 1);
}

// ── FrameOutputOptions ───────────────────────────────────────────

#[test]
fn resolve_keeps_source_size_by_default() {
    let output = FrameOutputOptions::default();
    assert_eq!(output.resolve_dimensions(1920, 1080), (1920, 1080));
}

#[test]
fn resolve_width_only_keeps_aspect_ratio() {
    let output = FrameOutputOptions {
        width: Some(640),
        ..FrameOutputOptions::default()
    };
    assert_eq!(output.resolve_dimensions(1920, 1080), (640, 360));
}

#[test]
fn resolve_height_only_keeps_aspect_ratio() {
    let output = FrameOutputOptions {
        height: Some(540),
        ..FrameOutputOptions::default()
    };
    assert_eq!(output.resolve_dimensions(1920, 1080), (960, 540));
}

#[test]
fn resolve_without_aspect_ratio_keeps_other_dimension() {
    let output = FrameOutputOptions {
        width: Some(640),
        maintain_aspect_ratio: false,
        ..FrameOutputOptions::default()
    };
    assert_eq!(output.resolve_dimensions(1920, 1080), (640, 1080));
}

#[test]
fn resolve_both_dimensions_is_exact() {
    let output = FrameOutputOptions {
        width: Some(100),
        height: Some(100),
        ..FrameOutputOptions::default()
    };
    assert_eq!(output.resolve_dimensions(1920, 1080), (100, 100));
}

// ── ProcessingOptions ────────────────────────────────────────────

#[test]
fn processing_options_defaults() {
    let options = ProcessingOptions::new();
    assert_eq!(
        options.policy,
        SelectionPolicy::ChangeRanked { sensitivity: 25 }
    );
    assert_eq!(options.max_frames, 8);
    assert!(options.use_cache);
}

#[test]
fn processing_options_builder() {
    let options = ProcessingOptions::new()
        .with_policy(SelectionPolicy::FixedStride { interval: 15 })
        .with_max_frames(4)
        .with_cache(false);

    assert_eq!(options.policy, SelectionPolicy::FixedStride { interval: 15 });
    assert_eq!(options.max_frames, 4);
    assert!(!options.use_cache);
}
