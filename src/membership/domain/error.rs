//! Error types for membership domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing membership domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MembershipDomainError {
    /// The login is empty.
    #[error("login must not be empty")]
    EmptyLogin,

    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,
}

/// Error returned while parsing membership states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown membership status: {0}")]
pub struct ParseMembershipStatusError(pub String);
