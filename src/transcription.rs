//! Transcription by polling a hosted job service.
//!
//! Hosted transcription services work in three steps: upload the audio,
//! request a transcript of the uploaded URL, then poll the job until it
//! completes. [`TranscriptionService`] captures those three calls;
//! [`PollingTranscriber`] drives them with a fixed poll interval and an
//! overall deadline, and reports failure and timeout as distinct errors.
//!
//! Time is read through a [`Clock`] so tests can run the loop without
//! sleeping.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use keyreel::{AssemblyAiClient, PollOptions, PollingTranscriber, Transcriber};
//!
//! let client = AssemblyAiClient::new("api-key")?;
//! let options = PollOptions::new().with_interval(Duration::from_secs(2));
//! let transcriber = PollingTranscriber::new(client, options);
//! let text = transcriber.transcribe(&std::fs::read("talk.wav")?)?;
//! println!("{text}");
//! # Ok::<(), keyreel::KeyReelError>(())
//! ```

use std::{
    cell::Cell,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crate::{
    error::KeyReelError,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
};

/// State of a transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptStatus {
    /// Accepted but not started.
    Queued,
    /// Running.
    Processing,
    /// Finished; carries the transcript text.
    Completed(String),
    /// Finished unsuccessfully; carries the service's reason.
    Failed(String),
}

impl TranscriptStatus {
    /// Interpret a status string as reported by the service.
    ///
    /// `completed` takes the transcript from `text` (empty if absent);
    /// `error` and `failed` take the reason from `error`. Unknown strings
    /// are treated as still processing.
    pub fn from_api(status: &str, text: Option<String>, error: Option<String>) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "queued" => TranscriptStatus::Queued,
            "completed" => TranscriptStatus::Completed(text.unwrap_or_default()),
            "error" | "failed" => TranscriptStatus::Failed(
                error.unwrap_or_else(|| "no reason given".to_string()),
            ),
            _ => TranscriptStatus::Processing,
        }
    }

    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranscriptStatus::Completed(_) | TranscriptStatus::Failed(_)
        )
    }
}

/// The three calls of a hosted transcription service.
pub trait TranscriptionService {
    /// Upload raw audio (or video) bytes; returns the URL the service
    /// assigned to them.
    fn upload(&self, audio: &[u8]) -> Result<String, KeyReelError>;

    /// Start a transcription job for an uploaded URL; returns the job id.
    fn request(&self, audio_url: &str) -> Result<String, KeyReelError>;

    /// Fetch the current state of a job.
    fn status(&self, job_id: &str) -> Result<TranscriptStatus, KeyReelError>;
}

/// Anything that turns audio bytes into text.
///
/// This is the seam [`ContentPipeline`](crate::ContentPipeline) depends on.
pub trait Transcriber {
    /// Transcribe `audio` and return the transcript.
    fn transcribe(&self, audio: &[u8]) -> Result<String, KeyReelError>;
}

/// `None` transcribes everything to an empty transcript, for runs without
/// transcription credentials.
impl<T: Transcriber> Transcriber for Option<T> {
    fn transcribe(&self, audio: &[u8]) -> Result<String, KeyReelError> {
        match self {
            Some(transcriber) => transcriber.transcribe(audio),
            None => Ok(String::new()),
        }
    }
}

/// Source of time for the polling loop.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// A clock that only moves when slept on. Useful in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
    slept: Cell<Duration>,
}

impl ManualClock {
    /// Start at the current instant.
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
            slept: Cell::new(Duration::ZERO),
        }
    }

    /// Total time passed to [`Clock::sleep`] so far.
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.slept.set(self.slept.get() + duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Polling cadence and deadline.
///
/// Defaults: poll every 5 seconds, give up after 300 seconds.
#[derive(Clone)]
pub struct PollOptions {
    /// Delay between status requests.
    pub interval: Duration,
    /// Total time allowed from the first status request.
    pub timeout: Duration,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl std::fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
            progress: Arc::new(NoOpProgress),
        }
    }
}

impl PollOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay between status requests.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Receive a progress report after every status request.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }
}

/// Drives a [`TranscriptionService`] to completion.
pub struct PollingTranscriber<S, C = SystemClock> {
    service: S,
    options: PollOptions,
    clock: C,
}

impl<S: TranscriptionService> PollingTranscriber<S, SystemClock> {
    /// Poll `service` using the real clock.
    pub fn new(service: S, options: PollOptions) -> Self {
        Self::with_clock(service, options, SystemClock)
    }
}

impl<S: TranscriptionService, C: Clock> PollingTranscriber<S, C> {
    /// Poll `service` using `clock` for time.
    pub fn with_clock(service: S, options: PollOptions, clock: C) -> Self {
        Self {
            service,
            options,
            clock,
        }
    }

    /// The wrapped service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Poll an already-submitted job until it finishes.
    ///
    /// # Errors
    ///
    /// - [`KeyReelError::TranscriptionFailed`] if the service reports the
    ///   job as failed.
    /// - [`KeyReelError::TranscriptionTimedOut`] if the job is still
    ///   running once the deadline has passed.
    /// - Any error from [`TranscriptionService::status`], unchanged.
    pub fn wait_for(&self, job_id: &str) -> Result<String, KeyReelError> {
        let started = self.clock.now();
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.options.progress),
            OperationType::TranscriptionPolling,
            None,
            1,
        );

        loop {
            let status = self.service.status(job_id)?;
            let elapsed = self.clock.now().saturating_duration_since(started);
            tracker.advance(None, Some(elapsed));
            log::debug!("Transcription {job_id}: {status:?} after {elapsed:?}");

            match status {
                TranscriptStatus::Completed(text) => return Ok(text),
                TranscriptStatus::Failed(reason) => {
                    return Err(KeyReelError::TranscriptionFailed(reason));
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {}
            }

            if elapsed >= self.options.timeout {
                return Err(KeyReelError::TranscriptionTimedOut(elapsed));
            }
            self.clock.sleep(self.options.interval);
        }
    }
}

impl<S: TranscriptionService, C: Clock> Transcriber for PollingTranscriber<S, C> {
    fn transcribe(&self, audio: &[u8]) -> Result<String, KeyReelError> {
        log::debug!("Uploading {} bytes for transcription", audio.len());
        let audio_url = self.service.upload(audio)?;
        let job_id = self.service.request(&audio_url)?;
        self.wait_for(&job_id)
    }
}
