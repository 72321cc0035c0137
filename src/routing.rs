//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Extension, Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{Session, auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    directory::{
        create_user_endpoint, delete_user_endpoint, get_users_page, increment_age_endpoint,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    ledger::{get_expenses_page, submit_expense_endpoint},
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::USERS_VIEW, get(get_users_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::USERS_API, post(create_user_endpoint))
            .route(endpoints::INCREMENT_AGE, post(increment_age_endpoint))
            .route(endpoints::DELETE_USER, delete(delete_user_endpoint))
            .route(endpoints::EXPENSES_API, post(submit_expense_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects admins to user management and everyone else
/// to their expenses.
async fn get_index_page(Extension(session): Extension<Session>) -> Redirect {
    if session.is_admin {
        Redirect::to(endpoints::USERS_VIEW)
    } else {
        Redirect::to(endpoints::EXPENSES_VIEW)
    }
}
