//! Handlers for the `/auth` resource (register, login, refresh, logout).
//!
//! Every form action answers with an [`ActionResponse`]: validation and
//! credential failures are data, with field errors translated for the
//! request locale and non-secret values echoed back.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use nexlead_core::credentials::{field_error_codes, LoginInput, RegisterInput};
use nexlead_db::models::session::CreateSession;
use nexlead_db::models::user::{CreateUser, User, UserResponse};
use nexlead_db::repositories::{SessionRepo, UserRepo, WizardSnapshotRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_opaque_token, hash_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::handlers::or_server_error;
use crate::i18n::Locale;
use crate::middleware::auth::AuthUser;
use crate::response::ActionResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication payload carried in the action result.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// POST /auth/register
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<RegisterInput>,
) -> Json<ActionResponse<AuthData>> {
    let result = register_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn register_inner(
    state: &AppState,
    locale: Locale,
    input: RegisterInput,
) -> AppResult<ActionResponse<AuthData>> {
    // Values to preserve on error (passwords are never echoed).
    let preserved = BTreeMap::from([
        ("name".to_string(), input.name.clone()),
        ("email".to_string(), input.email.clone()),
    ]);

    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("registerFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors)))
            .with_values(preserved));
    }

    if UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .is_some()
    {
        return Ok(ActionResponse::fail(locale.lookup("registerFailed"))
            .with_field_error("email", locale.lookup("emailExists"))
            .with_values(preserved));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(ActionResponse::ok(locale.lookup("registerSuccess")))
}

// ---------------------------------------------------------------------------
// POST /auth/login
// ---------------------------------------------------------------------------

pub async fn login(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<LoginInput>,
) -> Json<ActionResponse<AuthData>> {
    let result = login_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn login_inner(
    state: &AppState,
    locale: Locale,
    input: LoginInput,
) -> AppResult<ActionResponse<AuthData>> {
    let preserved = BTreeMap::from([("email".to_string(), input.email.clone())]);

    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors)))
            .with_values(preserved));
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        // Same message as a wrong password: login never reveals which
        // part was wrong.
        return Ok(ActionResponse::fail(locale.lookup("invalidCredentials")).with_values(preserved));
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        return Ok(ActionResponse::fail(locale.lookup("invalidCredentials")).with_values(preserved));
    }

    let data = create_auth_data(state, &user).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(ActionResponse::ok_with(locale.lookup("loginSuccess"), data))
}

// ---------------------------------------------------------------------------
// POST /auth/refresh
// ---------------------------------------------------------------------------

pub async fn refresh(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<RefreshRequest>,
) -> Json<ActionResponse<AuthData>> {
    let result = refresh_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn refresh_inner(
    state: &AppState,
    locale: Locale,
    input: RefreshRequest,
) -> AppResult<ActionResponse<AuthData>> {
    let token_hash = hash_token(&input.refresh_token);

    let Some(session) =
        SessionRepo::find_active_by_refresh_token_hash(&state.pool, &token_hash).await?
    else {
        return Ok(ActionResponse::fail(locale.lookup("tokenInvalid")));
    };

    // Rotation: the presented token is consumed either way.
    SessionRepo::revoke(&state.pool, session.id).await?;

    let Some(user) = UserRepo::find_by_id(&state.pool, session.user_id).await? else {
        return Ok(ActionResponse::fail(locale.lookup("tokenInvalid")));
    };

    let data = create_auth_data(state, &user).await?;
    Ok(ActionResponse::ok_with(locale.lookup("loginSuccess"), data))
}

// ---------------------------------------------------------------------------
// POST /auth/logout
// ---------------------------------------------------------------------------

/// Revoke all sessions for the authenticated user and clear the
/// session-scoped wizard snapshot slot.
pub async fn logout(
    State(state): State<AppState>,
    locale: Locale,
    auth: AuthUser,
) -> Json<ActionResponse> {
    let result = logout_inner(&state, locale, auth).await;
    Json(or_server_error(result, locale))
}

async fn logout_inner(
    state: &AppState,
    locale: Locale,
    auth: AuthUser,
) -> AppResult<ActionResponse> {
    WizardSnapshotRepo::delete_by_session(&state.pool, auth.session_id).await?;
    SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;

    // Drop any in-flight interview recording with the session.
    state.interviews.lock().await.remove(&auth.user_id);

    tracing::info!(user_id = auth.user_id, "User logged out");
    Ok(ActionResponse::ok(locale.lookup("logoutSuccess")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist a session row, and build
/// the auth payload. The new session id is embedded in the access
/// token's `sid` claim.
async fn create_auth_data(state: &AppState, user: &User) -> AppResult<AuthData> {
    let (refresh_plaintext, refresh_hash) = generate_opaque_token();

    let expires_at = Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at,
        },
    )
    .await?;

    let access_token = generate_access_token(user.id, session.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let expires_in = state.config.jwt.access_token_expiry_mins * 60;

    Ok(AuthData {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in,
        user: UserResponse::from(user),
    })
}
