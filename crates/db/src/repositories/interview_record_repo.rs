//! Repository for the `records` table.

use nexlead_core::types::DbId;
use sqlx::PgPool;

use crate::models::interview_record::{CreateInterviewRecord, InterviewRecord};

/// Column list for `records` queries.
const COLUMNS: &str = "id, user_id, question_text, transcript_text, audio_url, created_at";

/// Provides CRUD operations for confirmed interview answers.
pub struct InterviewRecordRepo;

impl InterviewRecordRepo {
    /// Insert a confirmed answer, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateInterviewRecord,
    ) -> Result<InterviewRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO records (user_id, question_text, transcript_text, audio_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InterviewRecord>(&query)
            .bind(input.user_id)
            .bind(&input.question_text)
            .bind(&input.transcript_text)
            .bind(&input.audio_url)
            .fetch_one(pool)
            .await
    }

    /// List a user's answers, oldest first (interview order).
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<InterviewRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM records WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, InterviewRecord>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
