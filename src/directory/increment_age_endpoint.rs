//! Defines the endpoint for adding a year to a user's age.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    auth::Session,
    directory::{core::increment_age, users_page::DirectoryState},
    endpoints,
    user::UserID,
};

/// A route handler for adding one year to the age of `user_id`.
///
/// On success the client is redirected to the user management page so that
/// the roster is loaded again.
pub async fn increment_age_endpoint(
    State(state): State<DirectoryState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    match increment_age(&session, user_id, state.user_store.as_ref()) {
        Ok(age) => {
            tracing::debug!("user {user_id} is now {age}");
            (
                HxRedirect(endpoints::USERS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not increment age of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod increment_age_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        auth::Session,
        db::initialize,
        directory::users_page::DirectoryState,
        endpoints,
        store::{SQLiteUserStore, UserStore},
        test_utils::assert_hx_redirect,
        user::{Age, NewUser, User, UserName},
    };

    use super::increment_age_endpoint;

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
    async fn increments_age_and_reloads_roster() {
        let (state, store) = get_state();
        let admin = insert_user(&store, "Root", true);
        let alice = insert_user(&store, "Alice", false);

        let response = increment_age_endpoint(
            State(state),
            Extension(Session::from(&admin)),
            Path(alice.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::USERS_VIEW);
        assert_eq!(
            store.get_user(alice.id).unwrap().age,
            Age::new_unchecked(31)
        );
    }

    #[tokio::test]
    async fn missing_user_returns_not_found_alert() {
        let (state, store) = get_state();
        let admin = insert_user(&store, "Root", true);

        let response =
            increment_age_endpoint(State(state), Extension(Session::from(&admin)), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn user_at_the_age_limit_is_not_incremented() {
        let (state, store) = get_state();
        let admin = insert_user(&store, "Root", true);
        let old = store
            .create_user(NewUser {
                name: UserName::new_unchecked("Old"),
                age: Age::new_unchecked(Age::MAX_YEARS),
                is_admin: false,
            })
            .unwrap();

        let response = increment_age_endpoint(
            State(state),
            Extension(Session::from(&admin)),
            Path(old.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get_user(old.id).unwrap().age, old.age);
        assert_eq!(store.list_users().unwrap(), vec![admin, old]);
    }

    #[tokio::test]
    async fn non_admin_cannot_increment_age() {
        let (state, store) = get_state();
        let alice = insert_user(&store, "Alice", false);

        let response = increment_age_endpoint(
            State(state),
            Extension(Session::from(&alice)),
            Path(alice.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            store.get_user(alice.id).unwrap().age,
            Age::new_unchecked(30)
        );
    }
}
