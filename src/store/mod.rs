//! The document store holding user records and their embedded expense histories.

mod sqlite;

use std::fmt::Debug;

pub use sqlite::{SQLiteUserStore, create_user_table};

use crate::{
    Error,
    ledger::Expense,
    user::{Age, NewUser, User, UserID},
};

/// Handles the creation, retrieval and modification of user records.
///
/// Implementations must be safe to share between request handlers, which hold
/// the store as an `Arc<dyn UserStore>`.
pub trait UserStore: Send + Sync + Debug {
    /// Get every user in the order they were created.
    fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Add a user with an empty expense history.
    fn create_user(&self, new_user: NewUser) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn get_user(&self, id: UserID) -> Result<User, Error>;

    /// Overwrite the fields set in `patch`, leaving the others as they are.
    ///
    /// Returns [Error::UpdateMissingUser] if no user with the given ID exists.
    fn update_user(&self, id: UserID, patch: UserPatch) -> Result<(), Error>;

    /// Remove a user along with their expense history.
    ///
    /// Returns [Error::DeleteMissingUser] if no user with the given ID exists.
    fn delete_user(&self, id: UserID) -> Result<(), Error>;

    /// Append `expense` to the user's history in a single store operation and
    /// return the updated history.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn append_expense(&self, id: UserID, expense: Expense) -> Result<Vec<Expense>, Error>;

    /// Add one year to the user's age in a single store operation and return
    /// the new age.
    ///
    /// Returns [Error::UpdateMissingUser] if no user with the given ID exists.
    fn increment_age(&self, id: UserID) -> Result<Age, Error>;
}

/// A partial update of a user record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub age: Option<Age>,
    pub expenses: Option<Vec<Expense>>,
}
