//! In-memory project store.

use super::poisoned;
use crate::membership::{
    domain::{Project, ProjectId},
    ports::{ProjectRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
}

impl InMemoryProjectRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored projects.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn len(&self) -> RepositoryResult<usize> {
        let projects = self.projects.read().map_err(|err| poisoned(&err))?;
        Ok(projects.len())
    }

    /// Returns `true` when no project is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> RepositoryResult<()> {
        let mut projects = self.projects.write().map_err(|err| poisoned(&err))?;
        if projects.contains_key(&project.id()) {
            return Err(RepositoryError::persistence(std::io::Error::other(format!(
                "duplicate project identifier: {}",
                project.id()
            ))));
        }
        projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        let projects = self.projects.read().map_err(|err| poisoned(&err))?;
        Ok(projects.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProjectId]) -> RepositoryResult<Vec<Project>> {
        let projects = self.projects.read().map_err(|err| poisoned(&err))?;
        Ok(ids
            .iter()
            .filter_map(|id| projects.get(id).cloned())
            .collect())
    }

    async fn remove(&self, id: ProjectId) -> RepositoryResult<bool> {
        let mut projects = self.projects.write().map_err(|err| poisoned(&err))?;
        Ok(projects.remove(&id).is_some())
    }
}
