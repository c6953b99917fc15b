//! Handlers for the onboarding wizard document.
//!
//! Each mutation endpoint loads the session's document (hydrating from
//! the snapshot slot), applies one [`WizardMutation`], and writes the
//! new document back, so every state transition is persisted. A
//! corrupted or absent snapshot silently degrades to the default
//! document -- reloading mid-wizard resumes, a fresh session starts
//! clean.

use axum::extract::{Path, State};
use axum::Json;
use nexlead_core::error::CoreError;
use nexlead_core::steps::{resume_step, OnboardingStep, STEPS};
use nexlead_core::types::DbId;
use nexlead_core::wizard::{
    apply, BusinessInfo, DocumentInfo, WebsiteInfo, WizardDocument, WizardMutation,
};
use nexlead_db::models::interview_record::CreateInterviewRecord;
use nexlead_db::repositories::{InterviewRecordRepo, WizardSnapshotRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Sequencer view of one step, derived from the document.
#[derive(Debug, Serialize)]
pub struct StepInfo {
    pub step: OnboardingStep,
    pub number: u8,
    pub label: &'static str,
    pub route: &'static str,
    pub optional: bool,
    pub complete: bool,
    pub progress_percent: u8,
}

/// The document plus derived step progress, returned by every wizard
/// endpoint.
#[derive(Debug, Serialize)]
pub struct WizardStateResponse {
    pub document: WizardDocument,
    pub steps: Vec<StepInfo>,
    /// Route of the first incomplete step; where a reloaded session
    /// resumes.
    pub resume_route: &'static str,
}

impl WizardStateResponse {
    pub(crate) fn new(document: WizardDocument) -> Self {
        let steps = STEPS
            .iter()
            .map(|&step| StepInfo {
                step,
                number: step.to_number(),
                label: step.label(),
                route: step.route(),
                optional: step.is_optional(),
                complete: step.is_complete(&document),
                progress_percent: step.progress_percent(),
            })
            .collect();
        let resume_route = resume_step(&document).route();
        Self {
            document,
            steps,
            resume_route,
        }
    }
}

// ---------------------------------------------------------------------------
// Document loading / persistence
// ---------------------------------------------------------------------------

/// Hydrate the wizard document for a session. Absent slots and
/// documents that no longer deserialize both fall back to the default
/// document; corruption must degrade to a fresh start, never an error.
pub(crate) async fn load_document(
    pool: &nexlead_db::DbPool,
    session_id: DbId,
) -> AppResult<WizardDocument> {
    let Some(snapshot) = WizardSnapshotRepo::find_by_session(pool, session_id).await? else {
        return Ok(WizardDocument::default());
    };
    match serde_json::from_value(snapshot.document) {
        Ok(document) => Ok(document),
        Err(e) => {
            tracing::warn!(session_id, error = %e, "Corrupt wizard snapshot; starting fresh");
            Ok(WizardDocument::default())
        }
    }
}

/// Apply one mutation to the session's document and persist the result.
pub(crate) async fn apply_and_save(
    state: &AppState,
    auth: &AuthUser,
    mutation: WizardMutation,
) -> AppResult<WizardDocument> {
    let current = load_document(&state.pool, auth.session_id).await?;
    let next = apply(&current, mutation);

    let serialized = serde_json::to_value(&next)
        .map_err(|e| AppError::InternalError(format!("Snapshot serialization error: {e}")))?;
    WizardSnapshotRepo::upsert(&state.pool, auth.session_id, &serialized).await?;

    Ok(next)
}

fn state_response(document: WizardDocument) -> Json<DataResponse<WizardStateResponse>> {
    Json(DataResponse {
        data: WizardStateResponse::new(document),
    })
}

// ---------------------------------------------------------------------------
// GET /onboarding/state
// ---------------------------------------------------------------------------

/// The hydration read: the session's document plus derived progress.
pub async fn get_state(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let document = load_document(&state.pool, auth.session_id).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// PUT /onboarding/business-info
// ---------------------------------------------------------------------------

pub async fn set_business_info(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut info): Json<BusinessInfo>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    info.name = info.name.trim().to_string();
    let document = apply_and_save(&state, &auth, WizardMutation::SetBusinessInfo(info)).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// PUT /onboarding/website
// ---------------------------------------------------------------------------

pub async fn set_website(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(info): Json<WebsiteInfo>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let trimmed = WebsiteInfo {
        url: info.url.trim().to_string(),
        linkedin: info.linkedin.trim().to_string(),
        facebook: info.facebook.trim().to_string(),
        twitter: info.twitter.trim().to_string(),
        youtube: info.youtube.trim().to_string(),
    };
    let document = apply_and_save(&state, &auth, WizardMutation::SetWebsiteInfo(trimmed)).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// PUT /onboarding/documents
// ---------------------------------------------------------------------------

pub async fn set_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(documents): Json<Vec<DocumentInfo>>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    validate_documents(&documents)?;
    let document = apply_and_save(&state, &auth, WizardMutation::SetDocuments(documents)).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// POST /onboarding/documents
// ---------------------------------------------------------------------------

pub async fn add_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(document_info): Json<DocumentInfo>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    validate_documents(std::slice::from_ref(&document_info))?;
    let document =
        apply_and_save(&state, &auth, WizardMutation::AddDocument(document_info)).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// DELETE /onboarding/documents/{index}
// ---------------------------------------------------------------------------

/// Out-of-range indexes are a no-op: the unchanged document is
/// returned.
pub async fn remove_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(index): Path<usize>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let document = apply_and_save(&state, &auth, WizardMutation::RemoveDocument { index }).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// PUT /onboarding/competitors
// ---------------------------------------------------------------------------

pub async fn set_competitors(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(competitors): Json<Vec<String>>,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let document = apply_and_save(&state, &auth, WizardMutation::SetCompetitors(competitors)).await?;
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// POST /onboarding/reset
// ---------------------------------------------------------------------------

pub async fn reset(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardStateResponse>>> {
    let document = apply_and_save(&state, &auth, WizardMutation::Reset).await?;
    state.interviews.lock().await.remove(&auth.user_id);
    Ok(state_response(document))
}

// ---------------------------------------------------------------------------
// POST /onboarding/complete
// ---------------------------------------------------------------------------

/// Result of completing onboarding.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    /// Confirmed interview answers persisted for this user.
    pub saved_answers: usize,
    pub redirect: &'static str,
}

/// Finish the wizard: persist the confirmed interview answers as
/// records and clear the snapshot slot.
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<CompletionResponse>>> {
    let document = load_document(&state.pool, auth.session_id).await?;

    let mut saved_answers = 0;
    for question in &document.voice_interview {
        let Some(transcript) = &question.transcript else {
            continue;
        };
        InterviewRecordRepo::create(
            &state.pool,
            &CreateInterviewRecord {
                user_id: auth.user_id,
                question_text: question.text.clone(),
                transcript_text: transcript.clone(),
                audio_url: None,
            },
        )
        .await?;
        saved_answers += 1;
    }

    WizardSnapshotRepo::delete_by_session(&state.pool, auth.session_id).await?;
    state.interviews.lock().await.remove(&auth.user_id);

    tracing::info!(user_id = auth.user_id, saved_answers, "Onboarding completed");
    Ok(Json(DataResponse {
        data: CompletionResponse {
            saved_answers,
            redirect: "/dashboard",
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Uploaded-document metadata must carry a name and a plausible size.
fn validate_documents(documents: &[DocumentInfo]) -> AppResult<()> {
    for doc in documents {
        if doc.name.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Document name must not be empty".to_string(),
            )));
        }
        if doc.size < 0 {
            return Err(AppError::Core(CoreError::Validation(
                "Document size must not be negative".to_string(),
            )));
        }
    }
    Ok(())
}
