//! Interview record entity model and DTOs.

use nexlead_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `records` table: one confirmed voice-interview
/// answer.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InterviewRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub question_text: String,
    pub transcript_text: String,
    pub audio_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new interview record.
#[derive(Debug, Clone)]
pub struct CreateInterviewRecord {
    pub user_id: DbId,
    pub question_text: String,
    pub transcript_text: String,
    pub audio_url: Option<String>,
}
