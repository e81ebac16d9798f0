//! Thread-safe in-memory adapters for every membership port.

mod memberships;
mod projects;
mod tags;
mod tasks;
mod users;

pub use memberships::InMemoryMembershipRepository;
pub use projects::InMemoryProjectRepository;
pub use tags::InMemoryTagLinks;
pub use tasks::InMemoryTaskRepository;
pub use users::InMemoryUserRepository;

use crate::membership::ports::RepositoryError;
use std::sync::PoisonError;

fn poisoned<T>(err: &PoisonError<T>) -> RepositoryError {
    RepositoryError::persistence(std::io::Error::other(err.to_string()))
}
