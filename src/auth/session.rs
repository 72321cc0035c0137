//! The logged-in user as seen by request handlers.

use crate::{
    Error,
    user::{User, UserID, UserName},
};

/// The user that a request is being made on behalf of.
///
/// A session is created when a user logs in and is resolved again from the
/// session cookie by [crate::auth::auth_guard] on every protected request,
/// so it always reflects the stored user record. Handlers receive it with
/// `Extension(session): Extension<Session>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserID,
    pub name: UserName,
    pub is_admin: bool,
}

impl Session {
    /// Check that the session may manage other users.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthorized] if the session user is not an admin.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin {
            Ok(())
        } else {
            tracing::warn!(
                "user {} tried to perform an admin action without permission",
                self.user_id
            );
            Err(Error::Unauthorized)
        }
    }
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}
