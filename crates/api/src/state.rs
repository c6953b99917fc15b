use std::collections::HashMap;
use std::sync::Arc;

use nexlead_core::recorder::RecordingSession;
use nexlead_core::types::DbId;
use nexlead_voice::agent::AgentConfig;
use nexlead_voice::transcribe::TranscriptionClient;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::mailer::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: nexlead_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// SMTP mailer; `None` when SMTP is unconfigured (codes are logged
    /// instead).
    pub mailer: Option<Arc<Mailer>>,
    /// Speech-to-text client; `None` when transcription is unconfigured.
    pub transcriber: Option<Arc<TranscriptionClient>>,
    /// Voice-agent configuration; `None` when the confirmation call is
    /// unconfigured.
    pub agent: Option<Arc<AgentConfig>>,
    /// In-flight interview recording sessions, one per user. The
    /// single-writer assumption of the wizard makes a plain map
    /// sufficient.
    pub interviews: Arc<Mutex<HashMap<DbId, RecordingSession>>>,
}
