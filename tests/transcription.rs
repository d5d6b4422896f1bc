//! Polling transcription tests.
//!
//! A scripted service plus [`ManualClock`] drives the loop without network
//! access or real sleeps. The HTTP client is exercised against a one-shot
//! local server.

mod common;

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use keyreel::{
    AssemblyAiClient, KeyReelError, ManualClock, OperationType, PollOptions, PollingTranscriber,
    ProgressCallback, ProgressInfo, Transcriber, TranscriptStatus, TranscriptionService,
};

/// Returns queued statuses in order, then repeats the last one forever.
struct ScriptedService {
    statuses: RefCell<VecDeque<TranscriptStatus>>,
    last: TranscriptStatus,
    polls: Cell<u32>,
    uploaded: RefCell<Vec<u8>>,
    requested: RefCell<Option<String>>,
}

impl ScriptedService {
    fn new(statuses: Vec<TranscriptStatus>) -> Self {
        let last = statuses
            .last()
            .cloned()
            .unwrap_or(TranscriptStatus::Processing);
        Self {
            statuses: RefCell::new(statuses.into()),
            last,
            polls: Cell::new(0),
            uploaded: RefCell::new(Vec::new()),
            requested: RefCell::new(None),
        }
    }
}

impl TranscriptionService for ScriptedService {
    fn upload(&self, audio: &[u8]) -> Result<String, KeyReelError> {
        self.uploaded.borrow_mut().extend_from_slice(audio);
        Ok("https://upload.example/audio-1".to_string())
    }

    fn request(&self, audio_url: &str) -> Result<String, KeyReelError> {
        *self.requested.borrow_mut() = Some(audio_url.to_string());
        Ok("job-1".to_string())
    }

    fn status(&self, job_id: &str) -> Result<TranscriptStatus, KeyReelError> {
        assert_eq!(job_id, "job-1");
        self.polls.set(self.polls.get() + 1);
        Ok(self
            .statuses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.last.clone()))
    }
}

struct FailingUpload;

impl TranscriptionService for FailingUpload {
    fn upload(&self, _audio: &[u8]) -> Result<String, KeyReelError> {
        Err(KeyReelError::TranscriptionRequest("HTTP 401".to_string()))
    }

    fn request(&self, _audio_url: &str) -> Result<String, KeyReelError> {
        panic!("request must not be called after a failed upload");
    }

    fn status(&self, _job_id: &str) -> Result<TranscriptStatus, KeyReelError> {
        panic!("status must not be called after a failed upload");
    }
}

fn options() -> PollOptions {
    PollOptions::new()
        .with_interval(Duration::from_secs(5))
        .with_timeout(Duration::from_secs(300))
}

#[test]
fn completes_after_several_polls() {
    let service = ScriptedService::new(vec![
        TranscriptStatus::Queued,
        TranscriptStatus::Processing,
        TranscriptStatus::Processing,
        TranscriptStatus::Completed("hello world".to_string()),
    ]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(service, options(), &clock);

    let text = transcriber.transcribe(b"audio bytes").expect("Transcription failed");

    assert_eq!(text, "hello world");
    assert_eq!(transcriber.service().polls.get(), 4);
    assert_eq!(clock.slept(), Duration::from_secs(15));
    assert_eq!(&*transcriber.service().uploaded.borrow(), b"audio bytes");
    assert_eq!(
        transcriber.service().requested.borrow().as_deref(),
        Some("https://upload.example/audio-1")
    );
}

#[test]
fn immediate_completion_never_sleeps() {
    let service = ScriptedService::new(vec![TranscriptStatus::Completed(String::new())]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(service, options(), &clock);

    assert_eq!(transcriber.wait_for("job-1").unwrap(), "");
    assert_eq!(clock.slept(), Duration::ZERO);
}

#[test]
fn failure_is_reported_with_reason() {
    let service = ScriptedService::new(vec![
        TranscriptStatus::Processing,
        TranscriptStatus::Failed("audio too short".to_string()),
    ]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(service, options(), &clock);

    match transcriber.transcribe(b"x") {
        Err(KeyReelError::TranscriptionFailed(reason)) => assert_eq!(reason, "audio too short"),
        other => panic!("Expected TranscriptionFailed, got: {other:?}"),
    }
}

#[test]
fn timeout_is_distinct_from_failure() {
    let service = ScriptedService::new(vec![TranscriptStatus::Processing]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(
        service,
        PollOptions::new()
            .with_interval(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(20)),
        &clock,
    );

    match transcriber.wait_for("job-1") {
        Err(KeyReelError::TranscriptionTimedOut(elapsed)) => {
            assert!(elapsed >= Duration::from_secs(20));
        }
        other => panic!("Expected TranscriptionTimedOut, got: {other:?}"),
    }
    // Polls at 0, 5, 10, 15, and 20 seconds.
    assert_eq!(transcriber.service().polls.get(), 5);
    assert_eq!(clock.slept(), Duration::from_secs(20));
}

#[test]
fn completion_on_deadline_poll_wins() {
    let service = ScriptedService::new(vec![
        TranscriptStatus::Processing,
        TranscriptStatus::Completed("just in time".to_string()),
    ]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(
        service,
        PollOptions::new()
            .with_interval(Duration::from_secs(10))
            .with_timeout(Duration::from_secs(10)),
        &clock,
    );

    assert_eq!(transcriber.wait_for("job-1").unwrap(), "just in time");
}

#[test]
fn service_errors_propagate_unchanged() {
    let transcriber =
        PollingTranscriber::with_clock(FailingUpload, options(), ManualClock::new());

    let result = transcriber.transcribe(b"audio");
    assert!(matches!(result, Err(KeyReelError::TranscriptionRequest(_))));
}

#[test]
fn polling_reports_progress() {
    struct Recording(Mutex<Vec<ProgressInfo>>);

    impl ProgressCallback for Recording {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    let recorder = Arc::new(Recording(Mutex::new(Vec::new())));
    let service = ScriptedService::new(vec![
        TranscriptStatus::Queued,
        TranscriptStatus::Completed("done".to_string()),
    ]);
    let clock = ManualClock::new();
    let transcriber = PollingTranscriber::with_clock(
        service,
        options().with_progress(Arc::clone(&recorder) as Arc<dyn ProgressCallback>),
        &clock,
    );

    transcriber.wait_for("job-1").unwrap();

    let infos = recorder.0.lock().unwrap();
    assert_eq!(infos.len(), 2);
    assert!(
        infos
            .iter()
            .all(|info| info.operation == OperationType::TranscriptionPolling)
    );
    assert_eq!(infos[1].current, 2);
    assert_eq!(infos[1].current_timestamp, Some(Duration::from_secs(5)));
}

#[test]
fn status_from_api_strings() {
    assert_eq!(
        TranscriptStatus::from_api("queued", None, None),
        TranscriptStatus::Queued
    );
    assert_eq!(
        TranscriptStatus::from_api("processing", None, None),
        TranscriptStatus::Processing
    );
    assert_eq!(
        TranscriptStatus::from_api("completed", Some("hi".to_string()), None),
        TranscriptStatus::Completed("hi".to_string())
    );
    assert_eq!(
        TranscriptStatus::from_api("completed", None, None),
        TranscriptStatus::Completed(String::new())
    );
    assert_eq!(
        TranscriptStatus::from_api("error", None, Some("bad audio".to_string())),
        TranscriptStatus::Failed("bad audio".to_string())
    );
    assert!(matches!(
        TranscriptStatus::from_api("failed", None, None),
        TranscriptStatus::Failed(_)
    ));
    assert_eq!(
        TranscriptStatus::from_api("something-new", None, None),
        TranscriptStatus::Processing
    );
}

#[test]
fn terminal_statuses() {
    assert!(TranscriptStatus::Completed(String::new()).is_terminal());
    assert!(TranscriptStatus::Failed(String::new()).is_terminal());
    assert!(!TranscriptStatus::Queued.is_terminal());
    assert!(!TranscriptStatus::Processing.is_terminal());
}

#[test]
fn error_messages_name_the_outcome() {
    let failed = KeyReelError::TranscriptionFailed("bad audio".to_string());
    let timed_out = KeyReelError::TranscriptionTimedOut(Duration::from_secs(300));

    assert!(failed.to_string().contains("bad audio"));
    assert!(timed_out.to_string().contains("timed out"));
}

// ── AssemblyAiClient ───────────────────────────────────────────────

#[test]
fn client_rejects_empty_key() {
    let result = AssemblyAiClient::new("   ");
    assert!(matches!(result, Err(KeyReelError::InvalidConfiguration(_))));
}

#[test]
fn client_trims_base_url() {
    let client = AssemblyAiClient::with_base_url("key", "http://127.0.0.1:9/")
        .expect("Client should build");
    assert_eq!(client.base_url(), "http://127.0.0.1:9");
}

#[test]
fn upload_returns_upload_url() {
    let (base_url, server) = common::serve_once(
        "200 OK",
        r#"{"upload_url": "https://cdn.example/audio-7"}"#,
    );
    let client = AssemblyAiClient::with_base_url("secret", base_url).unwrap();

    let url = client.upload(b"RIFF audio").expect("Upload failed");
    let request = server.join().unwrap();

    assert_eq!(url, "https://cdn.example/audio-7");
    assert_eq!(request.request_line(), "POST /v2/upload HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("secret"));
    assert_eq!(request.body, "RIFF audio");
}

#[test]
fn request_sends_audio_url_and_returns_job_id() {
    let (base_url, server) = common::serve_once(
        "200 OK",
        r#"{"id": "job-42", "status": "queued", "text": null}"#,
    );
    let client = AssemblyAiClient::with_base_url("secret", base_url).unwrap();

    let job = client
        .request("https://cdn.example/audio-7")
        .expect("Request failed");
    let request = server.join().unwrap();

    assert_eq!(job, "job-42");
    assert_eq!(request.request_line(), "POST /v2/transcript HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["audio_url"], "https://cdn.example/audio-7");
}

#[test]
fn status_parses_completed_transcript() {
    let (base_url, server) = common::serve_once(
        "200 OK",
        r#"{"id": "job-42", "status": "completed", "text": "hello there"}"#,
    );
    let client = AssemblyAiClient::with_base_url("secret", base_url).unwrap();

    let status = client.status("job-42").expect("Status failed");
    let request = server.join().unwrap();

    assert_eq!(status, TranscriptStatus::Completed("hello there".to_string()));
    assert_eq!(request.request_line(), "GET /v2/transcript/job-42 HTTP/1.1");
}

#[test]
fn status_parses_job_error() {
    let (base_url, server) = common::serve_once(
        "200 OK",
        r#"{"id": "job-42", "status": "error", "error": "file has no audio"}"#,
    );
    let client = AssemblyAiClient::with_base_url("secret", base_url).unwrap();

    let status = client.status("job-42").unwrap();
    server.join().unwrap();

    assert_eq!(status, TranscriptStatus::Failed("file has no audio".to_string()));
}

#[test]
fn non_success_status_keeps_response_body() {
    let (base_url, server) = common::serve_once(
        "401 Unauthorized",
        r#"{"error": "Invalid API key"}"#,
    );
    let client = AssemblyAiClient::with_base_url("wrong", base_url).unwrap();

    let result = client.upload(b"audio");
    server.join().unwrap();

    match result {
        Err(KeyReelError::TranscriptionRequest(message)) => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("Invalid API key"), "{message}");
        }
        other => panic!("Expected TranscriptionRequest, got: {other:?}"),
    }
}

// ── Optional transcriber ───────────────────────────────────────────

#[test]
fn missing_transcriber_yields_empty_transcript() {
    let transcriber: Option<PollingTranscriber<FailingUpload, ManualClock>> = None;
    assert_eq!(transcriber.transcribe(b"audio").unwrap(), "");

    let present = Some(PollingTranscriber::with_clock(
        FailingUpload,
        options(),
        ManualClock::new(),
    ));
    assert!(matches!(
        present.transcribe(b"audio"),
        Err(KeyReelError::TranscriptionRequest(_))
    ));
}
