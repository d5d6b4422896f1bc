//! Progress and cancellation tests.

use std::sync::{Arc, Mutex};

use image::DynamicImage;
use keyreel::{
    CancellationToken, DecodeOptions, Frame, FrameSource, InMemoryFrames, KeyReelError,
    OperationType, ProgressCallback, ProgressInfo, SelectionPolicy, TrackedSource, select,
};

fn frames(count: usize) -> InMemoryFrames {
    InMemoryFrames::from_images(vec![DynamicImage::new_luma8(2, 2); count], 10.0)
}

struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            infos: Mutex::new(Vec::new()),
        })
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Cancels its token once it has seen `after` frames.
struct CancelAfter {
    token: CancellationToken,
    after: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.current >= self.after {
            self.token.cancel();
        }
    }
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn options_report_cancellation() {
    let token = CancellationToken::new();
    let options = DecodeOptions::new().with_cancellation(token.clone());
    assert!(!options.is_cancelled());

    token.cancel();
    assert!(options.is_cancelled());
}

// ── TrackedSource ──────────────────────────────────────────────────

#[test]
fn cancelled_before_start_aborts_selection() {
    let token = CancellationToken::new();
    token.cancel();
    let options = DecodeOptions::new().with_cancellation(token);

    let result = select(
        TrackedSource::new(frames(10), &options),
        &SelectionPolicy::ChangeRanked { sensitivity: 25 },
        3,
    );

    assert!(matches!(result, Err(KeyReelError::Cancelled)));
}

#[test]
fn cancelled_mid_stream_aborts_selection() {
    let token = CancellationToken::new();
    let options = DecodeOptions::new()
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter { token, after: 4 }));

    let result = select(
        TrackedSource::new(frames(20), &options),
        &SelectionPolicy::ChangeRanked { sensitivity: 25 },
        3,
    );

    match result {
        Err(KeyReelError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
}

#[test]
fn tracked_source_stops_after_cancellation() {
    let token = CancellationToken::new();
    let options = DecodeOptions::new().with_cancellation(token.clone());
    let mut source = TrackedSource::new(frames(5), &options);

    assert!(matches!(source.next(), Some(Ok(_))));
    token.cancel();
    assert!(matches!(source.next(), Some(Err(KeyReelError::Cancelled))));
    assert!(source.next().is_none());
}

#[test]
fn progress_reports_every_frame_then_finishes() {
    let recorder = RecordingProgress::new();
    let options =
        DecodeOptions::new().with_progress(Arc::clone(&recorder) as Arc<dyn ProgressCallback>);

    let selected: Vec<Frame> = TrackedSource::new(frames(4), &options)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(selected.len(), 4);

    let infos = recorder.infos.lock().unwrap();
    // Four per-frame reports plus the final one.
    assert_eq!(infos.len(), 5);
    assert!(
        infos
            .iter()
            .all(|info| info.operation == OperationType::FrameDecoding)
    );
    assert_eq!(infos[0].current_frame, Some(0));
    assert_eq!(infos[2].current_frame, Some(2));
    assert_eq!(infos[2].total, Some(4));

    let last = infos.last().unwrap();
    assert_eq!(last.current, 4);
    assert_eq!(last.percentage, Some(100.0));
}

#[test]
fn progress_respects_batch_size() {
    let recorder = RecordingProgress::new();
    let options = DecodeOptions::new()
        .with_progress(Arc::clone(&recorder) as Arc<dyn ProgressCallback>)
        .with_batch_size(4);

    let count = TrackedSource::new(frames(10), &options).count();
    assert_eq!(count, 10);

    let infos = recorder.infos.lock().unwrap();
    // Reports at 4 and 8, plus the final report at 10.
    let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
    assert_eq!(currents, vec![4, 8, 10]);
}

#[test]
fn progress_carries_frame_timestamps() {
    let recorder = RecordingProgress::new();
    let options =
        DecodeOptions::new().with_progress(Arc::clone(&recorder) as Arc<dyn ProgressCallback>);

    TrackedSource::new(frames(3), &options).for_each(drop);

    let infos = recorder.infos.lock().unwrap();
    let timestamp = infos[2].current_timestamp.expect("Frame reports carry a timestamp");
    // Frame 2 at 10 fps.
    assert!((timestamp.as_secs_f64() - 0.2).abs() < 1e-9);
}

#[test]
fn tracked_source_forwards_source_details() {
    let tracked = TrackedSource::new(frames(7), &DecodeOptions::new());

    assert_eq!(tracked.frame_count(), 7);
    assert_eq!(tracked.frames_per_second(), 10.0);
    assert_eq!(tracked.into_inner().count(), 7);
}
