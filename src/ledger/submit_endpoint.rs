//! Defines the endpoint for recording a month's expenses.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    alert::Alert,
    auth::Session,
    ledger::{
        ExpenseAmounts,
        core::{submit_expense, view_history},
        expenses_page::{LedgerState, LedgerView},
        form::ExpenseForm,
    },
    timezone::get_local_offset,
};

/// A route handler for calculating and recording the session user's expenses.
///
/// Responds with the updated `#ledger` section. When an amount is invalid the
/// form is shown again with the values that were typed and nothing is stored.
pub async fn submit_expense_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let amounts = match ExpenseAmounts::parse(&form) {
        Ok(amounts) => amounts,
        Err(error) => {
            let history = match view_history(session.user_id, state.user_store.as_ref()) {
                Ok(history) => history,
                Err(error) => {
                    tracing::error!(
                        "Could not load expenses for user {}: {error}",
                        session.user_id
                    );
                    return error.into_alert_response();
                }
            };

            let error_message = error.to_string();

            return LedgerView {
                form: &form,
                error_message: Some(&error_message),
                latest: None,
                history: &history,
                local_offset,
            }
            .into_html()
            .into_response();
        }
    };

    match submit_expense(&session, amounts, state.user_store.as_ref()) {
        Ok(submission) => {
            let ledger = LedgerView {
                form: &ExpenseForm::default(),
                error_message: None,
                latest: Some(&submission.expense),
                history: &submission.history,
                local_offset,
            }
            .into_html();

            let alert = Alert::SuccessSimple {
                message: "Expenses saved".to_owned(),
            }
            .into_html();

            html! {
                (ledger)
                (alert)
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!(
                "Could not save expenses for user {}: {error}",
                session.user_id
            );
            error.into_alert_response()
        }
    }
}
