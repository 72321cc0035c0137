//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, forbidden::Forbidden, internal_server_error::InternalServerError,
    ledger::Category, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a user name.
    #[error("Name is required.")]
    EmptyName,

    /// The age entered for a user is not a positive whole number.
    #[error("Enter an age from 1 to 150.")]
    InvalidAge,

    /// An expense amount was blank, not a number, infinite or negative.
    #[error("{0} must be a number that is zero or more.")]
    InvalidAmount(Category),

    /// The expense amounts are each valid but add up to more than can be stored.
    #[error("The total is too large.")]
    TotalTooLarge,

    /// The requested resource was not found.
    ///
    /// For log-in this means no user has the entered name. Internally, this
    /// error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The session does not have the capability needed for the operation,
    /// e.g. a non-admin trying to manage users.
    #[error("you are not authorized to perform this action")]
    Unauthorized,

    /// The document store could not read or write a user record.
    ///
    /// The string should only be logged for debugging on the server.
    #[error("could not access the document store: {0}")]
    PersistError(String),

    /// Tried to update a user that does not exist.
    #[error("tried to update a user that is not in the store")]
    UpdateMissingUser,

    /// Tried to delete a user that does not exist.
    #[error("tried to delete a user that is not in the store")]
    DeleteMissingUser,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The session cookie could not be decoded or has expired.
    #[error("the session token is invalid or has expired")]
    InvalidToken,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::PersistError(error.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::Unauthorized => Forbidden {
                description: "You are not authorized to access User Management.",
            }
            .into_response(),
            Error::PersistError(_) => InternalServerError {
                description: "Could not load your data",
                fix: "The document store could not be reached. Please try again.",
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::EmptyName
            | Error::InvalidAge
            | Error::InvalidAmount(_)
            | Error::TotalTooLarge => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: self.to_string(),
                },
            ),
            Error::Unauthorized => (
                StatusCode::FORBIDDEN,
                Alert::Error {
                    message: "Not authorized".to_owned(),
                    details: "Only admins can manage users.".to_owned(),
                },
            ),
            Error::UpdateMissingUser => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update user".to_owned(),
                    details: "The user could not be found. \
                    Try refreshing the page to see if the user has been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingUser => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete user".to_owned(),
                    details: "The user could not be found. \
                    Try refreshing the page to see if the user has already been deleted."
                        .to_owned(),
                },
            ),
            Error::PersistError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Could not save changes".to_owned(),
                    details: "The document store could not be reached. Please try again."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
