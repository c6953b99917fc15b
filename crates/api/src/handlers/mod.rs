//! HTTP handlers, one module per resource.

pub mod agent;
pub mod auth;
pub mod interview;
pub mod password_reset;
pub mod wizard;

use serde::Serialize;

use crate::error::AppResult;
use crate::i18n::Locale;
use crate::response::ActionResponse;

/// Downgrade an unexpected failure to the generic server-error action
/// result. Expected business failures never reach this path -- they are
/// constructed as failing [`ActionResponse`]s inside the handlers; this
/// catches the rest (database outages, crypto errors) at the action
/// boundary so no exception crosses it.
pub(crate) fn or_server_error<T: Serialize>(
    result: AppResult<ActionResponse<T>>,
    locale: Locale,
) -> ActionResponse<T> {
    result.unwrap_or_else(|err| {
        tracing::error!(error = %err, "Action failed unexpectedly");
        ActionResponse::fail(locale.lookup("serverError"))
    })
}
