//! The user record held in the document store and its validated fields.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, ledger::Expense};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors. The ID is assigned by the store and should otherwise be treated as opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated, non-empty user name.
///
/// The name is the only thing a user enters to log in, so it is compared
/// exactly (case-sensitive) against the names in the store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    /// Create a user name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyName] if `name` is empty after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a user name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty
    /// invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserName::new(s)
    }
}

/// A user's age in whole years, from 1 to [Age::MAX_YEARS].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Age(u32);

impl Age {
    /// The oldest age that can be stored.
    pub const MAX_YEARS: u32 = 150;

    /// Create an age.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAge] if `years` is zero or more than [Age::MAX_YEARS].
    pub fn new(years: u32) -> Result<Self, Error> {
        if years == 0 || years > Self::MAX_YEARS {
            Err(Error::InvalidAge)
        } else {
            Ok(Self(years))
        }
    }

    /// Create an age without validation.
    ///
    /// The caller should ensure that `years` is from 1 to [Age::MAX_YEARS].
    pub fn new_unchecked(years: u32) -> Self {
        Self(years)
    }

    /// The age in years.
    pub fn years(&self) -> u32 {
        self.0
    }

    /// The age one year from now.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAge] if the age is already [Age::MAX_YEARS].
    pub fn next(&self) -> Result<Self, Error> {
        Age::new(self.0.saturating_add(1))
    }
}

impl Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Age {
    type Err = Error;

    /// Parse an age typed into a form, e.g. "30".
    ///
    /// Blank text, non-integers, zero, negative numbers and ages over
    /// [Age::MAX_YEARS] are all rejected with [Error::InvalidAge].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let years: u32 = s.trim().parse().map_err(|_| Error::InvalidAge)?;

        Age::new(years)
    }
}

/// A user of the application along with their expense history.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID assigned by the store.
    pub id: UserID,
    /// The name the user logs in with.
    pub name: UserName,
    pub age: Age,
    /// Whether the user may manage other users.
    pub is_admin: bool,
    /// The user's expenses in the order they were submitted.
    pub expenses: Vec<Expense>,
}

/// The fields needed to add a user to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: UserName,
    pub age: Age,
    pub is_admin: bool,
}
