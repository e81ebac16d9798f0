//! Registered users as seen by the membership workflow.

use super::{MembershipDomainError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique login a user is invited by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Login(String);

impl Login {
    /// Creates a login from `value` exactly as given.
    ///
    /// Logins are compared byte for byte, so no normalisation happens here;
    /// `" bob"` and `"bob"` are different logins.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipDomainError::EmptyLogin`] when the value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, MembershipDomainError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(MembershipDomainError::EmptyLogin);
        }
        Ok(Self(raw))
    }

    /// Returns the login as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user. Users are never modified by membership operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    login: Login,
}

impl User {
    /// Creates a user record.
    #[must_use]
    pub const fn new(id: UserId, login: Login) -> Self {
        Self { id, login }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the user's login.
    #[must_use]
    pub const fn login(&self) -> &Login {
        &self.login
    }
}
