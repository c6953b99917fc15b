//! Repository for the `wizard_snapshots` table.

use nexlead_core::types::DbId;
use sqlx::PgPool;

use crate::models::wizard_snapshot::WizardSnapshot;

/// Column list for `wizard_snapshots` queries.
const COLUMNS: &str = "id, session_id, document, created_at, updated_at";

/// Provides access to the per-session wizard snapshot slot.
pub struct WizardSnapshotRepo;

impl WizardSnapshotRepo {
    /// Write the document for a session, overwriting any prior value.
    pub async fn upsert(
        pool: &PgPool,
        session_id: DbId,
        document: &serde_json::Value,
    ) -> Result<WizardSnapshot, sqlx::Error> {
        let query = format!(
            "INSERT INTO wizard_snapshots (session_id, document)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_wizard_snapshots_session
             DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSnapshot>(&query)
            .bind(session_id)
            .bind(document)
            .fetch_one(pool)
            .await
    }

    /// Read the snapshot slot for a session, if one was ever written.
    pub async fn find_by_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Option<WizardSnapshot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wizard_snapshots WHERE session_id = $1");
        sqlx::query_as::<_, WizardSnapshot>(&query)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }

    /// Drop the slot (the session-scoped storage is cleared when the
    /// session ends). Returns `true` if a row was deleted.
    pub async fn delete_by_session(pool: &PgPool, session_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wizard_snapshots WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
