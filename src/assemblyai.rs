//! HTTP client for the AssemblyAI transcription service.
//!
//! Only the three endpoints needed by [`TranscriptionService`] are covered:
//! upload, transcript request, and transcript status. Responses are read
//! for the handful of fields the polling loop needs and nothing else.

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{
    error::KeyReelError,
    http,
    transcription::{TranscriptStatus, TranscriptionService},
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking AssemblyAI client.
#[derive(Debug, Clone)]
pub struct AssemblyAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl AssemblyAiClient {
    /// Create a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::InvalidConfiguration`] for an empty key, or
    /// [`KeyReelError::TranscriptionRequest`] if the HTTP client cannot be
    /// built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KeyReelError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root (a proxy or a local
    /// test server).
    ///
    /// # Errors
    ///
    /// Same as [`new`](AssemblyAiClient::new).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KeyReelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(KeyReelError::InvalidConfiguration(
                "transcription API key is empty".to_string(),
            ));
        }
        Ok(Self {
            http: http::client()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/{path}", self.base_url)
    }
}

fn check(response: Response, what: &str) -> Result<Response, KeyReelError> {
    http::check(response, what, KeyReelError::TranscriptionRequest)
}

impl TranscriptionService for AssemblyAiClient {
    fn upload(&self, audio: &[u8]) -> Result<String, KeyReelError> {
        let response = self
            .http
            .post(self.endpoint("upload"))
            .header("authorization", &self.api_key)
            .body(audio.to_vec())
            .send()?;
        let upload: UploadResponse = check(response, "upload")?.json()?;
        Ok(upload.upload_url)
    }

    fn request(&self, audio_url: &str) -> Result<String, KeyReelError> {
        let response = self
            .http
            .post(self.endpoint("transcript"))
            .header("authorization", &self.api_key)
            .json(&TranscriptRequest { audio_url })
            .send()?;
        let transcript: TranscriptResponse = check(response, "transcript request")?.json()?;
        log::debug!(
            "Transcription job {} created ({})",
            transcript.id,
            transcript.status
        );
        Ok(transcript.id)
    }

    fn status(&self, job_id: &str) -> Result<TranscriptStatus, KeyReelError> {
        let response = self
            .http
            .get(self.endpoint(&format!("transcript/{job_id}")))
            .header("authorization", &self.api_key)
            .send()?;
        let transcript: TranscriptResponse = check(response, "transcript status")?.json()?;
        Ok(TranscriptStatus::from_api(
            &transcript.status,
            transcript.text,
            transcript.error,
        ))
    }
}
