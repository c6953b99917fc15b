//! Handlers for password recovery: the reset-link flow and the
//! three-step OTP flow (request code, verify code, set new password).
//!
//! Verifying an OTP clears it (single use) and mints a short-lived
//! single-use reset grant; the final password reset must present that
//! grant, so skipping the verification step is not possible.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use nexlead_core::credentials::{
    field_error_codes, ForgotPasswordInput, ResetPasswordInput, VerifyOtpInput,
};
use nexlead_core::otp::{self, OtpRejection};
use nexlead_db::repositories::UserRepo;
use serde::Serialize;
use validator::Validate;

use crate::auth::jwt::{generate_opaque_token, hash_token};
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::handlers::or_server_error;
use crate::i18n::Locale;
use crate::response::ActionResponse;
use crate::state::AppState;

/// Lifetime of the grant minted by a successful OTP verification.
const RESET_GRANT_TTL_MINS: i64 = 15;

/// Lifetime of an emailed reset-link token.
const RESET_LINK_TTL_MINS: i64 = 60;

/// Grant returned by a successful OTP verification; step 3 must
/// present it.
#[derive(Debug, Serialize)]
pub struct ResetGrant {
    pub reset_token: String,
}

// ---------------------------------------------------------------------------
// POST /auth/forgot-password
// ---------------------------------------------------------------------------

/// Issue an emailed reset-link token for a known account.
pub async fn forgot_password(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<ForgotPasswordInput>,
) -> Json<ActionResponse> {
    let result = forgot_password_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn forgot_password_inner(
    state: &AppState,
    locale: Locale,
    input: ForgotPasswordInput,
) -> AppResult<ActionResponse> {
    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors))));
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_field_error("email", locale.lookup("emailNotFound")));
    };

    let (token, token_hash) = generate_opaque_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_LINK_TTL_MINS);
    UserRepo::store_reset_grant(&state.pool, user.id, &token_hash, expires_at).await?;

    match &state.mailer {
        Some(mailer) => mailer
            .send_reset_link(&user.email, &token)
            .await
            .map_err(|e| AppError::InternalError(format!("Reset email delivery failed: {e}")))?,
        None => tracing::debug!(user_id = user.id, %token, "SMTP unconfigured; reset token logged"),
    }

    tracing::info!(user_id = user.id, "Password reset link issued");
    Ok(ActionResponse::ok(locale.lookup("passwordResetSent")))
}

// ---------------------------------------------------------------------------
// POST /auth/send-otp
// ---------------------------------------------------------------------------

/// Step 1 of OTP recovery: generate a 6-digit code with a 10-minute
/// expiry, overwriting any prior code. Unknown emails mutate nothing.
pub async fn send_otp(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<ForgotPasswordInput>,
) -> Json<ActionResponse> {
    let result = send_otp_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn send_otp_inner(
    state: &AppState,
    locale: Locale,
    input: ForgotPasswordInput,
) -> AppResult<ActionResponse> {
    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors))));
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_field_error("email", locale.lookup("emailNotFound")));
    };

    let challenge = otp::issue(Utc::now());
    UserRepo::store_otp(&state.pool, user.id, &challenge.code, challenge.expires_at).await?;

    match &state.mailer {
        Some(mailer) => mailer
            .send_otp(&user.email, &challenge.code)
            .await
            .map_err(|e| AppError::InternalError(format!("OTP email delivery failed: {e}")))?,
        None => tracing::debug!(
            user_id = user.id,
            code = %challenge.code,
            "SMTP unconfigured; OTP logged"
        ),
    }

    tracing::info!(user_id = user.id, "OTP issued");
    Ok(ActionResponse::ok(locale.lookup("otpSent")))
}

// ---------------------------------------------------------------------------
// POST /auth/verify-otp
// ---------------------------------------------------------------------------

/// Step 2 of OTP recovery: check the submitted code against the stored
/// slot. Invalid and expired codes are distinct field errors; success
/// clears the slot and mints the reset grant.
pub async fn verify_otp(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<VerifyOtpInput>,
) -> Json<ActionResponse<ResetGrant>> {
    let result = verify_otp_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn verify_otp_inner(
    state: &AppState,
    locale: Locale,
    input: VerifyOtpInput,
) -> AppResult<ActionResponse<ResetGrant>> {
    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors))));
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_field_error("email", locale.lookup("emailNotFound")));
    };

    match otp::verify(
        user.otp_code.as_deref(),
        user.otp_expires_at,
        &input.otp,
        Utc::now(),
    ) {
        Ok(()) => {}
        Err(OtpRejection::Invalid) => {
            return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
                .with_field_error("otp", locale.lookup("otpInvalid")));
        }
        Err(OtpRejection::Expired) => {
            return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
                .with_field_error("otp", locale.lookup("otpExpired")));
        }
    }

    // Single use: the code is gone the moment it verifies.
    UserRepo::clear_otp(&state.pool, user.id).await?;

    let (token, token_hash) = generate_opaque_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_GRANT_TTL_MINS);
    UserRepo::store_reset_grant(&state.pool, user.id, &token_hash, expires_at).await?;

    tracing::info!(user_id = user.id, "OTP verified, reset grant minted");
    Ok(ActionResponse::ok_with(
        locale.lookup("otpVerified"),
        ResetGrant { reset_token: token },
    ))
}

// ---------------------------------------------------------------------------
// POST /auth/reset-password
// ---------------------------------------------------------------------------

/// Step 3 of OTP recovery (also the landing action of the reset-link
/// flow): present the grant token and set a new password. The grant is
/// cleared with the password update.
pub async fn reset_password(
    State(state): State<AppState>,
    locale: Locale,
    Json(input): Json<ResetPasswordInput>,
) -> Json<ActionResponse> {
    let result = reset_password_inner(&state, locale, input).await;
    Json(or_server_error(result, locale))
}

async fn reset_password_inner(
    state: &AppState,
    locale: Locale,
    input: ResetPasswordInput,
) -> AppResult<ActionResponse> {
    if let Err(errors) = input.validate() {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_errors(locale.translate_codes(&field_error_codes(&errors))));
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_field_error("email", locale.lookup("emailNotFound")));
    };

    let grant_valid = match (&user.reset_token_hash, user.reset_token_expires_at) {
        (Some(stored_hash), Some(expires_at)) => {
            *stored_hash == hash_token(&input.token) && Utc::now() <= expires_at
        }
        _ => false,
    };
    if !grant_valid {
        return Ok(ActionResponse::fail(locale.lookup("loginFailed"))
            .with_field_error("token", locale.lookup("tokenInvalid")));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // Clears the grant alongside the hash update (single use).
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password reset completed");
    Ok(ActionResponse::ok(locale.lookup("passwordResetSuccess")))
}
