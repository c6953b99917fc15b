//! Shared response envelope types for API handlers.
//!
//! Form-style operations answer with an [`ActionResponse`]: success or
//! failure plus field-scoped errors and echoed values, constructed
//! fresh per submission. Resource reads use the plain
//! [`DataResponse`] envelope.

use std::collections::BTreeMap;

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Result of a form submission.
///
/// `errors` maps field names to translated message lists; `values`
/// echoes non-secret field values back for re-rendering (passwords are
/// never included). `data` carries a typed success payload where the
/// operation has one (e.g. issued tokens).
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize = serde_json::Value> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
            values: None,
            data: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            values: None,
            data: None,
        }
    }

    /// Attach field-scoped error messages.
    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Attach a single field error.
    pub fn with_field_error(mut self, field: &str, message: impl Into<String>) -> Self {
        self.errors
            .get_or_insert_with(BTreeMap::new)
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self
    }

    /// Echo submitted values for re-rendering. Callers must never pass
    /// secret fields here.
    pub fn with_values(mut self, values: BTreeMap<String, String>) -> Self {
        self.values = Some(values);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_optional_fields() {
        let response: ActionResponse = ActionResponse::ok("done");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert!(json.get("errors").is_none());
        assert!(json.get("values").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn field_errors_accumulate() {
        let response: ActionResponse = ActionResponse::fail("nope")
            .with_field_error("email", "emailRequired")
            .with_field_error("email", "emailInvalid");
        let errors = response.errors.unwrap();
        assert_eq!(errors["email"], vec!["emailRequired", "emailInvalid"]);
    }
}
