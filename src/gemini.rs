//! [`TextGenerator`] backed by the Gemini `generateContent` endpoint.
//!
//! The prompt goes in as a text part and each context image as an inline
//! JPEG part. The reply's text parts are concatenated.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{error::KeyReelError, http, pipeline::TextGenerator};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// Blocking Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the production API and [`DEFAULT_MODEL`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::InvalidConfiguration`] for an empty key, or
    /// [`KeyReelError::Generation`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KeyReelError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root.
    ///
    /// # Errors
    ///
    /// Same as [`new`](GeminiClient::new).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KeyReelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(KeyReelError::InvalidConfiguration(
                "generation API key is empty".to_string(),
            ));
        }
        Ok(Self {
            http: http::client().map_err(request_error)?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Use another model, e.g. `gemini-1.5-flash`.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

fn request_error(error: reqwest::Error) -> KeyReelError {
    KeyReelError::Generation(error.to_string())
}

/// JPEG-encode `image` and wrap it as an inline data part.
fn image_part(image: &DynamicImage) -> Result<Value, KeyReelError> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut encoded, ImageFormat::Jpeg)?;
    Ok(json!({
        "inline_data": {
            "mime_type": "image/jpeg",
            "data": BASE64.encode(encoded.into_inner()),
        }
    }))
}

fn response_text(response: GenerateResponse) -> Result<String, KeyReelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }
    match response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        Some(reason) => Err(KeyReelError::Generation(format!(
            "prompt was blocked: {reason}"
        ))),
        None => Err(KeyReelError::Generation(
            "response contained no text".to_string(),
        )),
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str, images: &[DynamicImage]) -> Result<String, KeyReelError> {
        let mut parts = vec![json!({ "text": prompt })];
        for image in images {
            parts.push(image_part(image)?);
        }
        log::debug!(
            "Requesting copy from {} ({} chars, {} images)",
            self.model,
            prompt.len(),
            images.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({ "contents": [{ "role": "user", "parts": parts }] }))
            .send()
            .map_err(request_error)?;
        let response = http::check(response, "generateContent", KeyReelError::Generation)?;
        let body: GenerateResponse = response.json().map_err(request_error)?;
        response_text(body)
    }
}
