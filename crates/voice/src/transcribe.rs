//! Speech-to-text transcription client.
//!
//! Uploads a whole captured audio file (never streamed) to an
//! OpenAI-compatible `audio/transcriptions` endpoint and returns the
//! verbose transcription. Failures are typed so the interview layer can
//! treat them as retryable no-transcript outcomes.

use serde::{Deserialize, Serialize};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default transcription model.
const DEFAULT_MODEL: &str = "whisper-1";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the transcription service.
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Bearer API key.
    pub api_key: String,
    /// API base URL (no trailing slash).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
}

impl TranscriptionConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `TRANSCRIBE_API_KEY` is not set, signalling
    /// that transcription is not configured.
    ///
    /// | Variable              | Required | Default                     |
    /// |-----------------------|----------|-----------------------------|
    /// | `TRANSCRIBE_API_KEY`  | yes      | —                           |
    /// | `TRANSCRIBE_BASE_URL` | no       | `https://api.openai.com/v1` |
    /// | `TRANSCRIBE_MODEL`    | no       | `whisper-1`                 |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("TRANSCRIBE_API_KEY").ok()?;
        Some(Self {
            api_key,
            base_url: std::env::var("TRANSCRIBE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("TRANSCRIBE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One timed segment of a verbose transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A completed transcription, in the shape this platform's API serves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
    pub duration_in_seconds: Option<f64>,
}

/// The upstream `verbose_json` response shape.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    segments: Vec<TranscriptSegment>,
    language: Option<String>,
    duration: Option<f64>,
}

impl From<VerboseTranscription> for Transcription {
    fn from(raw: VerboseTranscription) -> Self {
        Self {
            text: raw.text,
            segments: raw.segments,
            language: raw.language,
            duration_in_seconds: raw.duration,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the transcription round-trip.
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    /// The request never completed (network, TLS, timeout).
    #[error("Transcription request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Transcription service returned status {status}")]
    Status { status: u16 },

    /// The audio payload was rejected before sending.
    #[error("Invalid audio upload: {0}")]
    InvalidUpload(String),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the transcription service.
pub struct TranscriptionClient {
    http: reqwest::Client,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Transcribe one audio file.
    ///
    /// The whole file is uploaded in a single multipart request;
    /// `file_name` and `mime_type` describe the captured blob
    /// (e.g. `recording.webm` / `audio/webm`).
    pub async fn transcribe(
        &self,
        file_name: &str,
        mime_type: &str,
        audio: Vec<u8>,
    ) -> Result<Transcription, TranscribeError> {
        if audio.is_empty() {
            return Err(TranscribeError::InvalidUpload(
                "Empty audio payload".to_string(),
            ));
        }

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| TranscribeError::InvalidUpload(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Transcription request rejected");
            return Err(TranscribeError::Status {
                status: status.as_u16(),
            });
        }

        let raw: VerboseTranscription = response.json().await?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_response_maps_to_public_shape() {
        let raw: VerboseTranscription = serde_json::from_value(serde_json::json!({
            "task": "transcribe",
            "text": "نساعد الشركات على النمو",
            "language": "arabic",
            "duration": 12.4,
            "segments": [
                { "id": 0, "start": 0.0, "end": 6.1, "text": "نساعد الشركات", "temperature": 0.0 },
                { "id": 1, "start": 6.1, "end": 12.4, "text": "على النمو" }
            ]
        }))
        .unwrap();

        let transcription: Transcription = raw.into();
        assert_eq!(transcription.text, "نساعد الشركات على النمو");
        assert_eq!(transcription.segments.len(), 2);
        assert_eq!(transcription.language.as_deref(), Some("arabic"));
        assert_eq!(transcription.duration_in_seconds, Some(12.4));
    }

    #[test]
    fn segments_default_to_empty() {
        let raw: VerboseTranscription =
            serde_json::from_value(serde_json::json!({ "text": "hi" })).unwrap();
        let transcription: Transcription = raw.into();
        assert!(transcription.segments.is_empty());
        assert_eq!(transcription.duration_in_seconds, None);
    }

    #[test]
    fn public_shape_serializes_camel_case() {
        let transcription = Transcription {
            text: "hi".into(),
            segments: vec![],
            language: Some("english".into()),
            duration_in_seconds: Some(1.5),
        };
        let json = serde_json::to_value(&transcription).unwrap();
        assert_eq!(json["durationInSeconds"], 1.5);
        assert!(json.get("duration_in_seconds").is_none());
    }
}
