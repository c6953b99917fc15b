//! Declarative validation schemas for the auth form payloads.
//!
//! Constraint violations carry message *codes* (`emailRequired`,
//! `passwordWeak`, ...) rather than prose; the api layer resolves codes
//! against the request locale's catalog before they reach the client.

use std::collections::BTreeMap;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// `POST /auth/login` payload.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, code = "emailRequired"), email(code = "emailInvalid"))]
    pub email: String,
    #[validate(length(min = 1, code = "passwordRequired"))]
    pub password: String,
}

/// `POST /auth/register` payload.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(custom(function = name_rules))]
    pub name: String,
    #[validate(length(min = 1, code = "emailRequired"), email(code = "emailInvalid"))]
    pub email: String,
    #[validate(custom(function = password_rules))]
    pub password: String,
    #[validate(must_match(other = password, code = "passwordMismatch"))]
    pub confirm_password: String,
}

/// `POST /auth/forgot-password` and `POST /auth/send-otp` payload.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordInput {
    #[validate(length(min = 1, code = "emailRequired"), email(code = "emailInvalid"))]
    pub email: String,
}

/// `POST /auth/verify-otp` payload.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpInput {
    #[validate(length(min = 1, code = "emailRequired"), email(code = "emailInvalid"))]
    pub email: String,
    #[validate(custom(function = otp_rules))]
    pub otp: String,
}

/// `POST /auth/reset-password` payload. `token` is either the grant
/// minted by OTP verification or a reset-link token.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordInput {
    #[validate(length(min = 1, code = "emailRequired"), email(code = "emailInvalid"))]
    pub email: String,
    #[validate(length(min = 1, code = "tokenRequired"))]
    pub token: String,
    #[validate(custom(function = "password_rules"))]
    pub password: String,
    #[validate(must_match(other = "password", code = "passwordMismatch"))]
    pub confirm_password: String,
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 120;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 255;

fn name_rules(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("nameRequired"));
    }
    if name.chars().count() < NAME_MIN {
        return Err(ValidationError::new("nameMinLength"));
    }
    if name.chars().count() > NAME_MAX {
        return Err(ValidationError::new("nameMaxLength"));
    }
    Ok(())
}

/// Passwords need length 8..=255 with at least one lowercase letter,
/// one uppercase letter, and one digit.
fn password_rules(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("passwordRequired"));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::new("passwordMinLength"));
    }
    if password.chars().count() > PASSWORD_MAX {
        return Err(ValidationError::new("passwordMaxLength"));
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(ValidationError::new("passwordWeak"));
    }
    Ok(())
}

fn otp_rules(otp: &str) -> Result<(), ValidationError> {
    if otp.is_empty() {
        return Err(ValidationError::new("otpRequired"));
    }
    if otp.chars().count() != crate::otp::OTP_LENGTH {
        return Err(ValidationError::new("otpLength"));
    }
    if !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("otpInvalid"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Flatten validator output into the `field -> [message codes]` map
/// carried by action results. Sorted map so output ordering is stable.
pub fn field_error_codes(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            (
                field.to_string(),
                errs.iter().map(|e| e.code.to_string()).collect(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn codes_for<T: Validate>(input: &T, field: &str) -> Vec<String> {
        match input.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => field_error_codes(&errors)
                .remove(field)
                .unwrap_or_default(),
        }
    }

    #[test]
    fn login_accepts_wellformed_input() {
        let input = LoginInput {
            email: "user@example.com".into(),
            password: "anything".into(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn login_empty_email_is_required_error() {
        let input = LoginInput {
            email: String::new(),
            password: "pw".into(),
        };
        let codes = codes_for(&input, "email");
        assert!(codes.contains(&"emailRequired".to_string()));
    }

    #[test]
    fn login_malformed_email_is_invalid_error() {
        let input = LoginInput {
            email: "not-an-email".into(),
            password: "pw".into(),
        };
        let codes = codes_for(&input, "email");
        assert!(codes.contains(&"emailInvalid".to_string()));
    }

    #[test]
    fn register_flags_weak_password() {
        let input = RegisterInput {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            password: "alllowercase1".into(),
            confirm_password: "alllowercase1".into(),
        };
        assert_eq!(codes_for(&input, "password"), vec!["passwordWeak"]);
    }

    #[test]
    fn register_flags_short_password_before_weakness() {
        let input = RegisterInput {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            password: "Ab1".into(),
            confirm_password: "Ab1".into(),
        };
        assert_eq!(codes_for(&input, "password"), vec!["passwordMinLength"]);
    }

    #[test]
    fn register_flags_mismatched_confirmation() {
        let input = RegisterInput {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            password: "Sufficient1".into(),
            confirm_password: "Different1".into(),
        };
        assert_eq!(
            codes_for(&input, "confirm_password"),
            vec!["passwordMismatch"]
        );
    }

    #[test]
    fn register_flags_short_name() {
        let input = RegisterInput {
            name: "D".into(),
            email: "dana@example.com".into(),
            password: "Sufficient1".into(),
            confirm_password: "Sufficient1".into(),
        };
        assert_eq!(codes_for(&input, "name"), vec!["nameMinLength"]);
    }

    #[test]
    fn register_accepts_wellformed_input() {
        let input = RegisterInput {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            password: "Sufficient1".into(),
            confirm_password: "Sufficient1".into(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn otp_length_and_digit_rules() {
        let base = |otp: &str| VerifyOtpInput {
            email: "user@example.com".into(),
            otp: otp.into(),
        };
        assert_eq!(codes_for(&base(""), "otp"), vec!["otpRequired"]);
        assert_eq!(codes_for(&base("1234"), "otp"), vec!["otpLength"]);
        assert_eq!(codes_for(&base("12345a"), "otp"), vec!["otpInvalid"]);
        assert!(base("123456").validate().is_ok());
    }

    #[test]
    fn reset_password_requires_token() {
        let input = ResetPasswordInput {
            email: "user@example.com".into(),
            token: String::new(),
            password: "Sufficient1".into(),
            confirm_password: "Sufficient1".into(),
        };
        assert_eq!(codes_for(&input, "token"), vec!["tokenRequired"]);
    }
}
