pub mod auth;
pub mod health;
pub mod onboarding;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                       register (public)
/// /auth/login                          login (public)
/// /auth/refresh                        refresh (public)
/// /auth/logout                         logout (requires auth)
/// /auth/forgot-password                issue reset-link token (public)
/// /auth/send-otp                       issue recovery code (public)
/// /auth/verify-otp                     verify code, mint reset grant (public)
/// /auth/reset-password                 set new password with grant (public)
///
/// /onboarding/state                    wizard document + step progress
/// /onboarding/business-info            set business info (PUT)
/// /onboarding/website                  set website/socials (PUT)
/// /onboarding/documents                replace list (PUT), add one (POST)
/// /onboarding/documents/{index}        remove one (DELETE)
/// /onboarding/competitors              set competitors (PUT)
/// /onboarding/reset                    reset to defaults (POST)
/// /onboarding/complete                 persist answers, clear slot (POST)
///
/// /onboarding/interview                recorder status (GET)
/// /onboarding/interview/start          begin capture (POST)
/// /onboarding/interview/stop           upload audio, transcribe (POST)
/// /onboarding/interview/restart        discard and re-record (POST)
/// /onboarding/interview/transcript     edit preview text (PUT)
/// /onboarding/interview/confirm        accept answer, advance (POST)
///
/// /onboarding/agent/session            seeded call variables (POST)
/// /onboarding/agent/ws                 browser <-> agent bridge (WS)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/onboarding", onboarding::router())
}
