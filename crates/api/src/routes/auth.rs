//! Route definitions for the `/auth` resource.
//!
//! ```text
//! POST /register          register
//! POST /login             login
//! POST /refresh           refresh
//! POST /logout            logout (auth)
//! POST /forgot-password   forgot_password
//! POST /send-otp          send_otp
//! POST /verify-otp        verify_otp
//! POST /reset-password    reset_password
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::{auth, password_reset};
use crate::state::AppState;

/// Auth routes — mounted at `/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(password_reset::forgot_password))
        .route("/send-otp", post(password_reset::send_otp))
        .route("/verify-otp", post(password_reset::verify_otp))
        .route("/reset-password", post(password_reset::reset_password))
}
