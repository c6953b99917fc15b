//! Wizard snapshot entity model.

use nexlead_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `wizard_snapshots` table: the serialized wizard
/// document for one auth session. At most one row per session
/// (`uq_wizard_snapshots_session`); rows disappear with their session.
#[derive(Debug, Clone, FromRow)]
pub struct WizardSnapshot {
    pub id: DbId,
    pub session_id: DbId,
    pub document: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
