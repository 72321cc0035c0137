//! Implements a SQLite backed user store.
//!
//! Each user is one row of the `user` table. The expense history is embedded
//! in the row as a JSON array so that a user record reads like a document.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    ledger::Expense,
    store::{UserPatch, UserStore},
    user::{Age, NewUser, User, UserID, UserName},
};

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER NOT NULL CHECK (age > 0 AND age <= 150),
                is_admin INTEGER NOT NULL DEFAULT 0,
                expenses TEXT NOT NULL DEFAULT '[]'
                )",
        (),
    )?;

    Ok(())
}

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    ///
    /// The tables should already have been created with [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_name: String = row.get(1)?;
    let age = Age::new_unchecked(row.get(2)?);
    let is_admin = row.get(3)?;
    let raw_expenses: String = row.get(4)?;

    Ok(User {
        id,
        name: UserName::new_unchecked(&raw_name),
        age,
        is_admin,
        expenses: parse_expenses(4, &raw_expenses)?,
    })
}

fn parse_expenses(column: usize, raw_expenses: &str) -> Result<Vec<Expense>, rusqlite::Error> {
    serde_json::from_str(raw_expenses).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
    })
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

/// serde_json writes non-finite numbers as `null`, which cannot be read back
/// as an amount, so expenses holding them must never reach the database.
fn ensure_finite<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Result<(), Error> {
    if expenses.into_iter().all(Expense::is_finite) {
        Ok(())
    } else {
        Err(Error::JSONSerializationError(
            "expense amounts must be finite numbers".to_owned(),
        ))
    }
}

impl UserStore for SQLiteUserStore {
    fn list_users(&self) -> Result<Vec<User>, Error> {
        self.lock()?
            .prepare("SELECT id, name, age, is_admin, expenses FROM user ORDER BY id ASC")?
            .query_map([], map_user_row)?
            .map(|maybe_user| maybe_user.map_err(Error::from))
            .collect()
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let connection = self.lock()?;

        connection.execute(
            "INSERT INTO user (name, age, is_admin) VALUES (?1, ?2, ?3)",
            (
                new_user.name.as_ref(),
                new_user.age.years(),
                new_user.is_admin,
            ),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User {
            id,
            name: new_user.name,
            age: new_user.age,
            is_admin: new_user.is_admin,
            expenses: Vec::new(),
        })
    }

    fn get_user(&self, id: UserID) -> Result<User, Error> {
        self.lock()?
            .prepare("SELECT id, name, age, is_admin, expenses FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], map_user_row)
            .map_err(|error| error.into())
    }

    fn update_user(&self, id: UserID, patch: UserPatch) -> Result<(), Error> {
        if let Some(expenses) = &patch.expenses {
            ensure_finite(expenses)?;
        }

        let expenses = patch.expenses.as_deref().map(to_json).transpose()?;
        let age = patch.age.map(|age| age.years());

        let rows_affected = self.lock()?.execute(
            "UPDATE user SET
                age = COALESCE(?1, age),
                expenses = COALESCE(?2, expenses)
            WHERE id = ?3",
            (age, expenses, id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::UpdateMissingUser);
        }

        Ok(())
    }

    fn delete_user(&self, id: UserID) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM user WHERE id = ?1", (id.as_i64(),))?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingUser);
        }

        Ok(())
    }

    fn append_expense(&self, id: UserID, expense: Expense) -> Result<Vec<Expense>, Error> {
        ensure_finite([&expense])?;
        let expense_json = to_json(&expense)?;

        let raw_expenses: String = self.lock()?.query_row(
            "UPDATE user SET expenses = json_insert(expenses, '$[#]', json(?1))
            WHERE id = ?2
            RETURNING expenses",
            (expense_json, id.as_i64()),
            |row| row.get(0),
        )?;

        parse_expenses(0, &raw_expenses).map_err(Error::from)
    }

    fn increment_age(&self, id: UserID) -> Result<Age, Error> {
        let connection = self.lock()?;

        let result = connection.query_row(
            "UPDATE user SET age = age + 1 WHERE id = ?1 AND age < ?2 RETURNING age",
            (id.as_i64(), Age::MAX_YEARS),
            |row| row.get::<_, u32>(0),
        );

        match result {
            Ok(years) => Ok(Age::new_unchecked(years)),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                let exists: bool = connection.query_row(
                    "SELECT EXISTS (SELECT 1 FROM user WHERE id = ?1)",
                    (id.as_i64(),),
                    |row| row.get(0),
                )?;

                if exists {
                    Err(Error::InvalidAge)
                } else {
                    Err(Error::UpdateMissingUser)
                }
            }
            Err(error) => Err(error.into()),
        }
    }
}
