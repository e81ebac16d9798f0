//! Port contracts for project membership.
//!
//! Ports define infrastructure-agnostic interfaces used by the membership
//! service.

pub mod repository;
pub mod tag_cleanup;

pub use repository::{
    AtomicTeardown, MembershipRepository, ProjectRepository, RepositoryError, RepositoryResult,
    TaskRepository, UserRepository,
};
pub use tag_cleanup::{TagCleanup, TagCleanupError};

#[cfg(test)]
pub use repository::MockProjectRepository;
#[cfg(test)]
pub use tag_cleanup::MockTagCleanup;
