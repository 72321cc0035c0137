//! The page shown when a user opens a page their session may not access.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct Forbidden<'a> {
    pub description: &'a str,
}

impl IntoResponse for Forbidden<'_> {
    fn into_response(self) -> Response {
        let page = error_view(
            "Forbidden",
            "403",
            self.description,
            "Ask an admin if you think you should have access.",
        );

        (StatusCode::FORBIDDEN, Html(page.into_string())).into_response()
    }
}
