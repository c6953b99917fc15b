//! One-time password issuance and verification.
//!
//! The OTP is a single-slot, single-use credential stored on the user
//! record: issuing a new code overwrites any prior one, and successful
//! verification (or expiry) clears it. This module owns the pure
//! lifecycle rules; persistence of the slot belongs to the caller.

use chrono::Duration;
use rand::Rng;

use crate::types::Timestamp;

/// Number of digits in a one-time password.
pub const OTP_LENGTH: usize = 6;

/// Absolute lifetime of an issued code, in minutes.
pub const OTP_TTL_MINS: i64 = 10;

/// A freshly issued code and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: Timestamp,
}

/// Why a submitted code was rejected. Invalid and expired are
/// distinguishable to the caller; both block progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpRejection {
    #[error("The code does not match")]
    Invalid,
    #[error("The code has expired")]
    Expired,
}

/// Issue a new random zero-padded numeric code expiring
/// [`OTP_TTL_MINS`] minutes from `now`.
pub fn issue(now: Timestamp) -> OtpChallenge {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    OtpChallenge {
        code: format!("{code:06}"),
        expires_at: now + Duration::minutes(OTP_TTL_MINS),
    }
}

/// Check a submitted code against the stored slot.
///
/// The code must match exactly and `now` must not be past the stored
/// expiry. A slot with no code rejects as invalid; a matching code with
/// no expiry on record rejects as expired.
pub fn verify(
    stored_code: Option<&str>,
    expires_at: Option<Timestamp>,
    submitted: &str,
    now: Timestamp,
) -> Result<(), OtpRejection> {
    match stored_code {
        Some(code) if code == submitted => {}
        _ => return Err(OtpRejection::Invalid),
    }
    match expires_at {
        Some(expiry) if now <= expiry => Ok(()),
        _ => Err(OtpRejection::Expired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn issued_codes_are_six_digits() {
        for _ in 0..64 {
            let challenge = issue(t0());
            assert_eq!(challenge.code.len(), OTP_LENGTH);
            assert!(challenge.code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let challenge = issue(t0());
        assert_eq!(challenge.expires_at, t0() + Duration::minutes(10));
    }

    #[test]
    fn matching_code_before_expiry_verifies() {
        let challenge = issue(t0());
        assert_eq!(
            verify(
                Some(&challenge.code),
                Some(challenge.expires_at),
                &challenge.code,
                t0() + Duration::minutes(5),
            ),
            Ok(())
        );
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let challenge = issue(t0());
        assert_eq!(
            verify(
                Some(&challenge.code),
                Some(challenge.expires_at),
                &challenge.code,
                challenge.expires_at,
            ),
            Ok(())
        );
    }

    #[test]
    fn matching_code_after_expiry_is_expired() {
        let challenge = issue(t0());
        assert_eq!(
            verify(
                Some(&challenge.code),
                Some(challenge.expires_at),
                &challenge.code,
                challenge.expires_at + Duration::seconds(1),
            ),
            Err(OtpRejection::Expired)
        );
    }

    #[test]
    fn wrong_code_is_invalid_even_when_fresh() {
        let challenge = issue(t0());
        let wrong = if challenge.code == "000000" {
            "000001"
        } else {
            "000000"
        };
        assert_eq!(
            verify(
                Some(&challenge.code),
                Some(challenge.expires_at),
                wrong,
                t0(),
            ),
            Err(OtpRejection::Invalid)
        );
    }

    #[test]
    fn empty_slot_is_invalid() {
        assert_eq!(
            verify(None, None, "123456", t0()),
            Err(OtpRejection::Invalid)
        );
    }

    #[test]
    fn matching_code_without_expiry_is_expired() {
        assert_eq!(
            verify(Some("123456"), None, "123456", t0()),
            Err(OtpRejection::Expired)
        );
    }
}
