//! Request-scoped message catalog.
//!
//! Validation and action messages travel through the code as stable
//! codes (`emailRequired`, `otpSent`, ...). Handlers resolve codes
//! against the catalog for the request's locale, extracted from
//! `Accept-Language`. The catalog is a plain lookup passed into the
//! handler flow -- no process-global locale state.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Supported locales. Arabic is the product default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ar,
    En,
}

impl Locale {
    /// Resolve from an `Accept-Language` header value. Only the primary
    /// tag of the first range is considered.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let Some(raw) = header else {
            return Self::default();
        };
        let primary = raw
            .split(',')
            .next()
            .unwrap_or("")
            .split(&['-', ';'][..])
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::En,
            _ => Self::default(),
        }
    }

    /// Resolve a message code. Unknown codes fall back to the code
    /// itself so a missing entry degrades visibly instead of erroring.
    pub fn lookup(self, key: &str) -> &str {
        let translated = match self {
            Self::Ar => ar(key),
            Self::En => en(key),
        };
        translated.unwrap_or(key)
    }

    /// Translate a `field -> [codes]` map into `field -> [messages]`.
    pub fn translate_codes(
        self,
        codes: &BTreeMap<String, Vec<String>>,
    ) -> BTreeMap<String, Vec<String>> {
        codes
            .iter()
            .map(|(field, list)| {
                (
                    field.clone(),
                    list.iter().map(|code| self.lookup(code).to_string()).collect(),
                )
            })
            .collect()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("accept-language")
            .and_then(|v| v.to_str().ok());
        Ok(Locale::from_accept_language(header))
    }
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        // validation
        "emailRequired" => "Email is required",
        "emailInvalid" => "Enter a valid email address",
        "emailExists" => "An account with this email already exists",
        "emailNotFound" => "No account found with this email",
        "nameRequired" => "Name is required",
        "nameMinLength" => "Name must be at least 2 characters",
        "nameMaxLength" => "Name must be at most 120 characters",
        "passwordRequired" => "Password is required",
        "passwordMinLength" => "Password must be at least 8 characters",
        "passwordMaxLength" => "Password must be at most 255 characters",
        "passwordWeak" => "Password must contain a lowercase letter, an uppercase letter, and a digit",
        "passwordMismatch" => "Passwords do not match",
        "otpRequired" => "Verification code is required",
        "otpLength" => "Verification code must be 6 digits",
        "otpInvalid" => "Verification code is incorrect",
        "otpExpired" => "Verification code has expired",
        "tokenRequired" => "Reset token is required",
        "tokenInvalid" => "Reset token is invalid or expired",
        "invalidCredentials" => "Incorrect email or password",
        // auth actions
        "loginFailed" => "Sign-in failed",
        "loginSuccess" => "Signed in successfully",
        "registerFailed" => "Registration failed",
        "registerSuccess" => "Account created successfully",
        "logoutSuccess" => "Signed out successfully",
        "passwordResetSent" => "Password reset instructions sent",
        "passwordResetSuccess" => "Password updated successfully",
        "otpSent" => "Verification code sent",
        "otpVerified" => "Verification code confirmed",
        // errors
        "serverError" => "Something went wrong. Please try again.",
        _ => return None,
    })
}

fn ar(key: &str) -> Option<&'static str> {
    Some(match key {
        // validation
        "emailRequired" => "البريد الإلكتروني مطلوب",
        "emailInvalid" => "أدخل بريداً إلكترونياً صالحاً",
        "emailExists" => "يوجد حساب بهذا البريد الإلكتروني بالفعل",
        "emailNotFound" => "لا يوجد حساب بهذا البريد الإلكتروني",
        "nameRequired" => "الاسم مطلوب",
        "nameMinLength" => "يجب أن يتكون الاسم من حرفين على الأقل",
        "nameMaxLength" => "يجب ألا يتجاوز الاسم 120 حرفاً",
        "passwordRequired" => "كلمة المرور مطلوبة",
        "passwordMinLength" => "يجب أن تتكون كلمة المرور من 8 أحرف على الأقل",
        "passwordMaxLength" => "يجب ألا تتجاوز كلمة المرور 255 حرفاً",
        "passwordWeak" => "يجب أن تحتوي كلمة المرور على حرف صغير وحرف كبير ورقم",
        "passwordMismatch" => "كلمتا المرور غير متطابقتين",
        "otpRequired" => "رمز التحقق مطلوب",
        "otpLength" => "يجب أن يتكون رمز التحقق من 6 أرقام",
        "otpInvalid" => "رمز التحقق غير صحيح",
        "otpExpired" => "انتهت صلاحية رمز التحقق",
        "tokenRequired" => "رمز إعادة التعيين مطلوب",
        "tokenInvalid" => "رمز إعادة التعيين غير صالح أو منتهي الصلاحية",
        "invalidCredentials" => "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        // auth actions
        "loginFailed" => "فشل تسجيل الدخول",
        "loginSuccess" => "تم تسجيل الدخول بنجاح",
        "registerFailed" => "فشل إنشاء الحساب",
        "registerSuccess" => "تم إنشاء الحساب بنجاح",
        "logoutSuccess" => "تم تسجيل الخروج بنجاح",
        "passwordResetSent" => "تم إرسال تعليمات إعادة تعيين كلمة المرور",
        "passwordResetSuccess" => "تم تحديث كلمة المرور بنجاح",
        "otpSent" => "تم إرسال رمز التحقق",
        "otpVerified" => "تم تأكيد رمز التحقق",
        // errors
        "serverError" => "حدث خطأ ما. يرجى المحاولة مرة أخرى.",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_arabic() {
        assert_eq!(Locale::from_accept_language(None), Locale::Ar);
        assert_eq!(Locale::from_accept_language(Some("fr-FR")), Locale::Ar);
    }

    #[test]
    fn english_ranges_resolve_to_english() {
        assert_eq!(Locale::from_accept_language(Some("en")), Locale::En);
        assert_eq!(
            Locale::from_accept_language(Some("en-US,en;q=0.9,ar;q=0.8")),
            Locale::En
        );
    }

    #[test]
    fn known_codes_translate_per_locale() {
        assert_eq!(Locale::En.lookup("otpExpired"), "Verification code has expired");
        assert_eq!(Locale::Ar.lookup("otpExpired"), "انتهت صلاحية رمز التحقق");
    }

    #[test]
    fn unknown_codes_fall_back_to_the_code() {
        assert_eq!(Locale::En.lookup("noSuchKey"), "noSuchKey");
    }

    #[test]
    fn code_maps_translate_fieldwise() {
        let mut codes = BTreeMap::new();
        codes.insert("email".to_string(), vec!["emailRequired".to_string()]);
        let translated = Locale::En.translate_codes(&codes);
        assert_eq!(translated["email"], vec!["Email is required"]);
    }

    #[test]
    fn every_english_key_has_an_arabic_entry() {
        const KEYS: [&str; 29] = [
            "emailRequired",
            "emailInvalid",
            "emailExists",
            "emailNotFound",
            "nameRequired",
            "nameMinLength",
            "nameMaxLength",
            "passwordRequired",
            "passwordMinLength",
            "passwordMaxLength",
            "passwordWeak",
            "passwordMismatch",
            "otpRequired",
            "otpLength",
            "otpInvalid",
            "otpExpired",
            "tokenRequired",
            "tokenInvalid",
            "invalidCredentials",
            "loginFailed",
            "loginSuccess",
            "registerFailed",
            "registerSuccess",
            "logoutSuccess",
            "passwordResetSent",
            "passwordResetSuccess",
            "otpSent",
            "otpVerified",
            "serverError",
        ];
        for key in KEYS {
            assert!(en(key).is_some(), "missing en entry for {key}");
            assert!(ar(key).is_some(), "missing ar entry for {key}");
        }
    }
}
