//! Defines the endpoint for adding a user.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error, auth::Session, directory::core::create_user, directory::users_page::DirectoryState,
    endpoints,
};

use super::users_page::create_user_form;

/// The raw values typed into the add user form.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    pub name: String,
    pub age: String,
}

/// A route handler for adding a non-admin user.
///
/// Invalid names and ages are shown in the form along with the values the
/// admin typed. On success the client is redirected to the user management
/// page so that the roster is loaded again.
pub async fn create_user_endpoint(
    State(state): State<DirectoryState>,
    Extension(session): Extension<Session>,
    Form(form): Form<CreateUserForm>,
) -> Response {
    match create_user(&session, &form.name, &form.age, state.user_store.as_ref()) {
        Ok(_) => (
            HxRedirect(endpoints::USERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyName | Error::InvalidAge)) => {
            create_user_form(&form.name, &form.age, Some(&error.to_string())).into_response()
        }
        Err(error) => {
            tracing::error!("Could not create user: {error}");
            error.into_alert_response()
        }
    }
}
