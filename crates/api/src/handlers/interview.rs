//! Handlers for the voice-interview recording loop.
//!
//! Each authenticated user owns at most one [`RecordingSession`], held
//! in [`AppState::interviews`]. The endpoints drive its transitions:
//! start/stop/restart capture, transcription hand-off, preview edits,
//! and confirmation into the wizard document. The recording ceiling is
//! enforced by ticking the machine with the current wall clock whenever
//! a request observes it. A failed transcription never errors the
//! request: the machine falls back to idle and the user retries.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use nexlead_core::recorder::{RecorderPhase, RecordingSession, MAX_RECORDING_SECS};
use nexlead_core::wizard::{InterviewQuestion, WizardDocument, WizardMutation};
use nexlead_voice::transcribe::Transcription;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::wizard::{apply_and_save, load_document, WizardStateResponse};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Recorder view returned by every interview endpoint.
#[derive(Debug, Serialize)]
pub struct InterviewStatus {
    #[serde(flatten)]
    pub phase: RecorderPhase,
    pub elapsed_secs: i64,
    pub max_secs: i64,
    /// The question currently being answered.
    pub question: Option<InterviewQuestion>,
    pub all_completed: bool,
}

impl InterviewStatus {
    fn new(session: &RecordingSession, document: &WizardDocument) -> Self {
        let now = Utc::now();
        Self {
            phase: session.phase().clone(),
            elapsed_secs: session.elapsed_secs(now),
            max_secs: MAX_RECORDING_SECS,
            question: document.current_question().cloned(),
            all_completed: document.interview_completed(),
        }
    }
}

/// Result of a stop: recorder status plus the transcription when the
/// round-trip succeeded.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    #[serde(flatten)]
    pub status: InterviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Transcription>,
}

/// Request body for `PUT /onboarding/interview/transcript`.
#[derive(Debug, Deserialize)]
pub struct EditTranscriptRequest {
    pub transcript: String,
}

// ---------------------------------------------------------------------------
// GET /onboarding/interview
// ---------------------------------------------------------------------------

/// Current recorder status. Ticking here force-stops a capture that
/// outran the ceiling between requests.
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<InterviewStatus>>> {
    let document = load_document(&state.pool, auth.session_id).await?;

    let mut interviews = state.interviews.lock().await;
    let session = interviews.entry(auth.user_id).or_default();
    session.tick(Utc::now());

    Ok(Json(DataResponse {
        data: InterviewStatus::new(session, &document),
    }))
}

// ---------------------------------------------------------------------------
// POST /onboarding/interview/start
// ---------------------------------------------------------------------------

pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<InterviewStatus>>> {
    let document = load_document(&state.pool, auth.session_id).await?;

    let mut interviews = state.interviews.lock().await;
    let session = interviews.entry(auth.user_id).or_default();
    session.start(Utc::now()).map_err(AppError::Core)?;

    tracing::info!(user_id = auth.user_id, "Interview recording started");
    Ok(Json(DataResponse {
        data: InterviewStatus::new(session, &document),
    }))
}

// ---------------------------------------------------------------------------
// POST /onboarding/interview/restart
// ---------------------------------------------------------------------------

/// Discard the in-flight capture or preview and record again
/// immediately.
pub async fn restart(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<InterviewStatus>>> {
    let document = load_document(&state.pool, auth.session_id).await?;

    let mut interviews = state.interviews.lock().await;
    let session = interviews.entry(auth.user_id).or_default();
    session.restart(Utc::now());

    tracing::info!(user_id = auth.user_id, "Interview recording restarted");
    Ok(Json(DataResponse {
        data: InterviewStatus::new(session, &document),
    }))
}

// ---------------------------------------------------------------------------
// POST /onboarding/interview/stop
// ---------------------------------------------------------------------------

/// Stop the capture and send the uploaded audio through the
/// transcription collaborator. The whole file arrives as one multipart
/// `audio` field.
pub async fn stop(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<StopResponse>>> {
    let upload = read_audio_upload(multipart).await?;
    let now = Utc::now();

    {
        let mut interviews = state.interviews.lock().await;
        let session = interviews.entry(auth.user_id).or_default();
        // The ceiling may already have force-stopped the capture; that
        // is not an error, the audio still gets transcribed.
        if !session.tick(now) {
            let duration = session.stop(now).map_err(AppError::Core)?;
            tracing::info!(
                user_id = auth.user_id,
                duration_secs = duration,
                "Interview recording stopped"
            );
        }
    }

    // Transcribe without holding the lock; the machine stays in the
    // transcribing phase meanwhile.
    let transcription = match &state.transcriber {
        Some(client) => client
            .transcribe(&upload.file_name, &upload.mime_type, upload.bytes)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = auth.user_id, error = %e, "Transcription failed");
                e
            })
            .ok(),
        None => {
            tracing::warn!("Transcription is not configured; recording discarded");
            None
        }
    };

    let document = load_document(&state.pool, auth.session_id).await?;
    let mut interviews = state.interviews.lock().await;
    let session = interviews.entry(auth.user_id).or_default();
    match &transcription {
        Some(t) => session.transcription_succeeded(t.text.clone()),
        None => session.transcription_failed(),
    }

    Ok(Json(DataResponse {
        data: StopResponse {
            status: InterviewStatus::new(session, &document),
            transcription,
        },
    }))
}

// ---------------------------------------------------------------------------
// PUT /onboarding/interview/transcript
// ---------------------------------------------------------------------------

/// Replace the previewed transcript with user-edited text. Edits touch
/// only the preview; nothing is persisted until confirmation.
pub async fn edit_transcript(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<EditTranscriptRequest>,
) -> AppResult<Json<DataResponse<InterviewStatus>>> {
    let document = load_document(&state.pool, auth.session_id).await?;

    let mut interviews = state.interviews.lock().await;
    let session = interviews.entry(auth.user_id).or_default();
    session.set_editing(true).map_err(AppError::Core)?;
    session
        .edit_transcript(body.transcript)
        .map_err(AppError::Core)?;
    session.set_editing(false).map_err(AppError::Core)?;

    Ok(Json(DataResponse {
        data: InterviewStatus::new(session, &document),
    }))
}

// ---------------------------------------------------------------------------
// POST /onboarding/interview/confirm
// ---------------------------------------------------------------------------

/// Accept the previewed transcript: the current question is marked
/// completed with it, the next pending question becomes current, and
/// the updated document is persisted.
pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let transcript = {
        let mut interviews = state.interviews.lock().await;
        let session = interviews.entry(auth.user_id).or_default();
        session.confirm().map_err(AppError::Core)?
    };

    let document = load_document(&state.pool, auth.session_id).await?;
    let Some(question) = document.current_question() else {
        return Err(AppError::Core(nexlead_core::CoreError::Validation(
            "No question is awaiting an answer".to_string(),
        )));
    };
    let question_id = question.id;

    let updated = apply_and_save(
        &state,
        &auth,
        WizardMutation::UpdateQuestionTranscript {
            id: question_id,
            transcript,
        },
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        question_id,
        "Interview answer confirmed"
    );
    Ok(Json(DataResponse {
        data: WizardStateResponse::new(updated),
    }))
}

// ---------------------------------------------------------------------------
// Upload handling
// ---------------------------------------------------------------------------

struct AudioUpload {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Pull the `audio` field out of the multipart body.
async fn read_audio_upload(mut multipart: Multipart) -> AppResult<AudioUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("recording.webm")
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("audio/webm")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read audio upload: {e}")))?
            .to_vec();
        return Ok(AudioUpload {
            file_name,
            mime_type,
            bytes,
        });
    }
    Err(AppError::BadRequest(
        "Missing 'audio' field in upload".to_string(),
    ))
}
