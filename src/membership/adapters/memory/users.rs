//! In-memory user directory.

use super::poisoned;
use crate::membership::{
    domain::{Login, User, UserId},
    ports::{RepositoryResult, UserRepository},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory user repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<UserState>>,
}

#[derive(Debug, Default)]
struct UserState {
    users: HashMap<UserId, User>,
    login_index: HashMap<Login, UserId>,
}

impl InMemoryUserRepository {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user, replacing any user with the same login.
    ///
    /// # Errors
    ///
    /// Returns [`crate::membership::ports::RepositoryError::Persistence`]
    /// when the state lock is poisoned.
    pub fn insert(&self, user: User) -> RepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        if let Some(previous) = state.login_index.insert(user.login().clone(), user.id()) {
            state.users.remove(&previous);
        }
        state.users.insert(user.id(), user);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &Login) -> RepositoryResult<Option<User>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state
            .login_index
            .get(login)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }
}
