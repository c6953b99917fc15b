//! Route definitions for the onboarding wizard, voice interview, and
//! confirmation call.
//!
//! ```text
//! GET    /state                    get_state
//! PUT    /business-info            set_business_info
//! PUT    /website                  set_website
//! PUT    /documents                set_documents
//! POST   /documents                add_document
//! DELETE /documents/{index}        remove_document
//! PUT    /competitors              set_competitors
//! POST   /reset                    reset
//! POST   /complete                 complete
//! GET    /interview                status
//! POST   /interview/start          start
//! POST   /interview/stop           stop
//! POST   /interview/restart        restart
//! PUT    /interview/transcript     edit_transcript
//! POST   /interview/confirm        confirm
//! POST   /agent/session            session
//! GET    /agent/ws                 ws
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{agent, interview, wizard};
use crate::state::AppState;

/// Upper bound on an interview audio upload. A 180-second capture at
/// 128 kbit/s is around 3 MB; the ceiling leaves generous headroom.
const MAX_AUDIO_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Onboarding routes — mounted at `/onboarding`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(wizard::get_state))
        .route("/business-info", put(wizard::set_business_info))
        .route("/website", put(wizard::set_website))
        .route(
            "/documents",
            put(wizard::set_documents).post(wizard::add_document),
        )
        .route("/documents/{index}", delete(wizard::remove_document))
        .route("/competitors", put(wizard::set_competitors))
        .route("/reset", post(wizard::reset))
        .route("/complete", post(wizard::complete))
        .route("/interview", get(interview::status))
        .route("/interview/start", post(interview::start))
        .route("/interview/stop", post(interview::stop))
        .route("/interview/restart", post(interview::restart))
        .route("/interview/transcript", put(interview::edit_transcript))
        .route("/interview/confirm", post(interview::confirm))
        .route("/agent/session", post(agent::session))
        .route("/agent/ws", get(agent::ws))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_UPLOAD_BYTES))
}
