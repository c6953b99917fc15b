//! Auth session entity model and DTOs.

use nexlead_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sessions` table. One row per issued refresh token;
/// the wizard snapshot slot is keyed by this row's id.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    /// SHA-256 hex digest of the refresh token; the plaintext is never
    /// stored.
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}
