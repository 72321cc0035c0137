//! Directory operations: logging in by name and managing the user roster.
//!
//! Every roster change checks that the session belongs to an admin before the
//! store is touched.

use crate::{
    Error,
    auth::Session,
    store::UserStore,
    user::{Age, NewUser, User, UserID, UserName},
};

/// Find the user to log in as.
///
/// Names are compared exactly, including case. If more than one user has the
/// name, the first one created is returned.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyName] if `name` is blank.
/// - [Error::NotFound] if no user has the name.
pub fn log_in(name: &str, store: &dyn UserStore) -> Result<User, Error> {
    let name = UserName::new(name)?;

    store
        .list_users()?
        .into_iter()
        .find(|user| user.name == name)
        .ok_or(Error::NotFound)
}

/// Get every user for the user management page.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the session is not an admin.
pub fn list_users(session: &Session, store: &dyn UserStore) -> Result<Vec<User>, Error> {
    session.require_admin()?;

    store.list_users()
}

/// Add a non-admin user with an empty expense history.
///
/// `name` and `age` are the raw form values.
///
/// # Errors
///
/// Returns:
/// - [Error::Unauthorized] if the session is not an admin.
/// - [Error::EmptyName] if `name` is blank.
/// - [Error::InvalidAge] if `age` is not a whole number from 1 to [Age::MAX_YEARS].
///
/// Nothing is written to the store if an error is returned.
pub fn create_user(
    session: &Session,
    name: &str,
    age: &str,
    store: &dyn UserStore,
) -> Result<User, Error> {
    session.require_admin()?;

    let name = UserName::new(name)?;
    let age: Age = age.parse()?;

    let user = store.create_user(NewUser {
        name,
        age,
        is_admin: false,
    })?;

    tracing::info!("user {} created user {}", session.user_id, user.id);

    Ok(user)
}

/// Add one year to the age of `user_id` and return the new age.
///
/// # Errors
///
/// Returns:
/// - [Error::Unauthorized] if the session is not an admin.
/// - [Error::InvalidAge] if the user is already [Age::MAX_YEARS] years old.
/// - [Error::UpdateMissingUser] if the user does not exist.
pub fn increment_age(
    session: &Session,
    user_id: UserID,
    store: &dyn UserStore,
) -> Result<Age, Error> {
    session.require_admin()?;

    store.increment_age(user_id)
}

/// Permanently remove `user_id` along with their expense history.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the session is not an admin, or
/// [Error::DeleteMissingUser] if the user does not exist.
pub fn delete_user(session: &Session, user_id: UserID, store: &dyn UserStore) -> Result<(), Error> {
    session.require_admin()?;

    store.delete_user(user_id)?;

    tracing::info!("user {} deleted user {}", session.user_id, user_id);

    Ok(())
}

#[cfg(test)]
mod directory_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        auth::Session,
        db::initialize,
        store::{SQLiteUserStore, UserStore},
        user::{Age, NewUser, User, UserID, UserName},
    };

    use super::{create_user, delete_user, increment_age, list_users, log_in};

    fn get_store() -> SQLiteUserStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteUserStore::new(Arc::new(Mutex::new(connection)))
    }

    fn insert_user(store: &SQLiteUserStore, name: &str, is_admin: bool) -> User {
        store
            .create_user(NewUser {
                name: UserName::new_unchecked(name),
                age: Age::new_unchecked(40),
                is_admin,
            })
            .unwrap()
    }

    fn admin_session(store: &SQLiteUserStore) -> Session {
        Session::from(&insert_user(store, "Admin", true))
    }

    #[test]
    fn log_in_finds_user_by_exact_name() {
        let store = get_store();
        let alice = insert_user(&store, "Alice", false);

        assert_eq!(log_in("Alice", &store), Ok(alice.clone()));
        assert_eq!(log_in("  Alice ", &store), Ok(alice));
        assert_eq!(log_in("alice", &store), Err(Error::NotFound));
    }

    #[test]
    fn log_in_returns_first_match() {
        let store = get_store();
        let first = insert_user(&store, "Sam", false);
        insert_user(&store, "Sam", true);

        assert_eq!(log_in("Sam", &store), Ok(first));
    }

    #[test]
    fn log_in_with_unknown_name_fails() {
        let store = get_store();

        assert_eq!(log_in("Ghost", &store), Err(Error::NotFound));
    }

    #[test]
    fn log_in_with_blank_name_fails() {
        let store = get_store();

        assert_eq!(log_in("   ", &store), Err(Error::EmptyName));
    }

    #[test]
    fn create_user_then_log_in_as_non_admin() {
        let store = get_store();
        let admin = admin_session(&store);

        let alice = create_user(&admin, "Alice", "30", &store).unwrap();

        assert!(!alice.is_admin);
        assert_eq!(alice.age, Age::new_unchecked(30));
        assert!(alice.expenses.is_empty());
        assert!(!log_in("Alice", &store).unwrap().is_admin);
    }

    #[test]
    fn create_user_rejects_invalid_input_without_writing() {
        let store = get_store();
        let admin = admin_session(&store);

        assert_eq!(
            create_user(&admin, "  ", "30", &store),
            Err(Error::EmptyName)
        );
        assert_eq!(
            create_user(&admin, "Alice", "thirty", &store),
            Err(Error::InvalidAge)
        );
        assert_eq!(
            create_user(&admin, "Alice", "0", &store),
            Err(Error::InvalidAge)
        );
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn non_admin_cannot_change_roster() {
        let store = get_store();
        let alice = insert_user(&store, "Alice", false);
        let session = Session::from(&alice);

        assert_eq!(list_users(&session, &store), Err(Error::Unauthorized));
        assert_eq!(
            create_user(&session, "Bob", "20", &store),
            Err(Error::Unauthorized)
        );
        assert_eq!(
            increment_age(&session, alice.id, &store),
            Err(Error::Unauthorized)
        );
        assert_eq!(
            delete_user(&session, alice.id, &store),
            Err(Error::Unauthorized)
        );

        assert_eq!(store.list_users().unwrap(), vec![alice]);
    }

    #[test]
    fn increment_age_adds_one_year() {
        let store = get_store();
        let admin = admin_session(&store);
        let alice = create_user(&admin, "Alice", "30", &store).unwrap();

        assert_eq!(
            increment_age(&admin, alice.id, &store),
            Ok(Age::new_unchecked(31))
        );
    }

    #[test]
    fn delete_user_then_get_fails() {
        let store = get_store();
        let admin = admin_session(&store);
        let alice = create_user(&admin, "Alice", "30", &store).unwrap();

        delete_user(&admin, alice.id, &store).unwrap();

        assert_eq!(store.get_user(alice.id), Err(Error::NotFound));
        assert_eq!(
            delete_user(&admin, alice.id, &store),
            Err(Error::DeleteMissingUser)
        );
    }

    #[test]
    fn list_users_includes_everyone() {
        let store = get_store();
        let admin = admin_session(&store);
        create_user(&admin, "Alice", "30", &store).unwrap();
        create_user(&admin, "Bob", "8", &store).unwrap();

        let names = list_users(&admin, &store)
            .unwrap()
            .into_iter()
            .map(|user| user.name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Admin", "Alice", "Bob"]);
    }

    #[test]
    fn increment_age_stops_at_the_limit() {
        let store = get_store();
        let admin = admin_session(&store);
        let old = create_user(&admin, "Old", "150", &store).unwrap();

        assert_eq!(
            increment_age(&admin, old.id, &store),
            Err(Error::InvalidAge)
        );
        assert_eq!(
            create_user(&admin, "Older", "4294967295", &store),
            Err(Error::InvalidAge)
        );

        assert_eq!(store.get_user(old.id).unwrap().age, Age::new_unchecked(150));
        assert!(log_in("Old", &store).is_ok());
        assert_eq!(list_users(&admin, &store).unwrap().len(), 2);
    }

    #[test]
    fn increment_age_of_missing_user_fails() {
        let store = get_store();
        let admin = admin_session(&store);

        assert_eq!(
            increment_age(&admin, UserID::new(999), &store),
            Err(Error::UpdateMissingUser)
        );
    }
}
