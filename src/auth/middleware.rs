//! Authentication middleware that resolves the session, extends it, and handles redirects.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Session,
        cookie::{
            extend_auth_cookie_duration_if_needed, get_token_from_cookies, invalidate_auth_cookie,
        },
    },
    endpoints,
    internal_server_error::get_internal_server_error_redirect,
    store::UserStore,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The store used to look up the user named in the session cookie.
    pub user_store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            user_store: state.user_store.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How the middleware should respond when the request cannot be authenticated.
#[derive(Clone, Copy)]
enum GuardKind {
    /// Full page requests get a normal HTTP redirect.
    Page,
    /// HTMX requests get a `HX-Redirect` so the whole page is replaced.
    Htmx,
}

impl GuardKind {
    fn redirect_to_log_in(self, jar: PrivateCookieJar) -> Response {
        let jar = invalidate_auth_cookie(jar);

        match self {
            GuardKind::Page => (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response(),
            GuardKind::Htmx => (
                jar,
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::OK,
            )
                .into_response(),
        }
    }

    fn error_response(self, error: Error) -> Response {
        match self {
            GuardKind::Page => error.into_response(),
            GuardKind::Htmx => get_internal_server_error_redirect(),
        }
    }
}

/// Checks for a valid session cookie and resolves it into a [Session].
///
/// The session is placed into the request and then the request executed
/// normally, otherwise the client is sent back to the log-in page.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    kind: GuardKind,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return kind.redirect_to_log_in(PrivateCookieJar::new(state.cookie_key.clone()));
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("No valid session for {}: {error}", parts.uri.path());
            return kind.redirect_to_log_in(jar);
        }
    };

    let session = match state.user_store.get_user(user_id) {
        Ok(user) => Session::from(&user),
        Err(Error::NotFound) => {
            tracing::info!("Session refers to user {user_id} who no longer exists.");
            return kind.redirect_to_log_in(jar);
        }
        Err(error) => {
            tracing::error!("Could not load user {user_id} for session: {error}");
            return kind.error_response(error);
        }
    };

    parts.extensions.insert(session);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid session cookie.
/// The session is placed into the request and then the request executed normally if the cookie is valid, otherwise a redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(session): Extension<Session>` to receive the session.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, GuardKind::Page).await
}

/// Middleware function that checks for a valid session cookie.
/// The session is placed into the request and then the request executed normally if the cookie is valid, otherwise a HTMX redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(session): Extension<Session>` to receive the session.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, GuardKind::Htmx).await
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        extract::{Path, State},
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Session, auth_guard, auth_guard_hx,
            set_auth_cookie,
        },
        db::initialize,
        endpoints::{self, format_endpoint},
        store::{SQLiteUserStore, UserStore},
        user::{Age, NewUser, UserID, UserName},
    };

    async fn test_handler(Extension(session): Extension<Session>) -> String {
        format!("Hello, {}!", session.name)
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        Path(user_id): Path<i64>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(user_id), state.cookie_duration)
    }

    const TEST_LOG_IN_ROUTE_PATH: &str = "/log_in/{user_id}";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_state(cookie_duration: Duration) -> (AuthState, Arc<SQLiteUserStore>) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = Arc::new(SQLiteUserStore::new(Arc::new(Mutex::new(connection))));

        let hash = sha2::Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration,
            user_store: store.clone(),
        };

        (state, store)
    }

    fn create_alice(store: &SQLiteUserStore) -> UserID {
        store
            .create_user(NewUser {
                name: UserName::new_unchecked("Alice"),
                age: Age::new_unchecked(30),
                is_admin: false,
            })
            .unwrap()
            .id
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn get_test_server_hx(state: AuthState) -> TestServer {
        let app = Router::new()
            .route(TEST_API_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let (state, store) = get_state(DEFAULT_COOKIE_DURATION);
        let user_id = create_alice(&store);
        let server = get_test_server(state);

        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, user_id.as_i64()))
            .await;
        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("Hello, Alice!");
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {:?}, want {:?}",
            left,
            right
        );
    }

    #[tokio::test]
    async fn auth_guard_extends_valid_cookie_duration() {
        let (state, store) = get_state(Duration::seconds(5));
        let user_id = create_alice(&store);
        let server = get_test_server(state);

        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, user_id.as_i64()))
            .await;
        response.assert_status_ok();
        let jar = response.cookies();

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;
        let response_time = OffsetDateTime::now_utc();

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            response_time + Duration::seconds(5),
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn get_protected_route_with_no_auth_cookie_redirects_to_log_in() {
        let (state, _) = get_state(DEFAULT_COOKIE_DURATION);
        let server = get_test_server(state);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_auth_cookie_redirects_to_log_in() {
        let (state, _) = get_state(DEFAULT_COOKIE_DURATION);
        let server = get_test_server(state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn session_of_deleted_user_redirects_to_log_in() {
        let (state, store) = get_state(DEFAULT_COOKIE_DURATION);
        let user_id = create_alice(&store);
        let server = get_test_server(state);
        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, user_id.as_i64()))
            .await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        store.delete_user(user_id).unwrap();
        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn api_route_uses_hx_redirect() {
        let (state, _) = get_state(DEFAULT_COOKIE_DURATION);
        let server = get_test_server_hx(state);

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);
    }
}
