//! Defines the endpoint for deleting a user.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    auth::Session,
    directory::{core::delete_user, users_page::DirectoryState},
    endpoints,
    user::UserID,
};

/// A route handler for permanently deleting `user_id` and their expenses.
///
/// On success the client is redirected to the user management page so that
/// the roster is loaded again.
pub async fn delete_user_endpoint(
    State(state): State<DirectoryState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<i64>,
) -> Response {
    match delete_user(&session, UserID::new(user_id), state.user_store.as_ref()) {
        Ok(()) => (
            HxRedirect(endpoints::USERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not delete user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_user_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::Session,
        db::initialize,
        directory::users_page::DirectoryState,
        endpoints,
        store::{SQLiteUserStore, UserStore},
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_fragment},
        user::{Age, NewUser, User, UserName},
    };

    use super::delete_user_endpoint;

    fn get_state() -> (DirectoryState, Arc<SQLiteUserStore>) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = Arc::new(SQLiteUserStore::new(Arc::new(Mutex::new(connection))));

        (
            DirectoryState {
                user_store: store.clone(),
            },
            store,
        )
    }

    fn insert_user(store: &SQLiteUserStore, name: &str, is_admin: bool) -> User {
        store
            .create_user(NewUser {
                name: UserName::new_unchecked(name),
                age: Age::new_unchecked(30),
                is_admin,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn deletes_user_and_reloads_roster() {
        let (state, store) = get_state();
        let admin = insert_user(&store, "Root", true);
        let alice = insert_user(&store, "Alice", false);

        let response = delete_user_endpoint(
            State(state),
            Extension(Session::from(&admin)),
            Path(alice.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::USERS_VIEW);
        assert_eq!(store.get_user(alice.id), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn deleting_missing_user_shows_alert() {
        let (state, store) = get_state();
        let admin = insert_user(&store, "Root", true);

        let response =
            delete_user_endpoint(State(state), Extension(Session::from(&admin)), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Could not delete user"), "got {text}");
    }

    #[tokio::test]
    async fn non_admin_cannot_delete_users() {
        let (state, store) = get_state();
        let alice = insert_user(&store, "Alice", false);

        let response = delete_user_endpoint(
            State(state),
            Extension(Session::from(&alice)),
            Path(alice.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(store.get_user(alice.id).is_ok());
    }
}
