//! In-memory task store indexed by project.

use super::poisoned;
use crate::membership::{
    domain::{ProjectId, ProjectTask, TaskId},
    ports::{RepositoryError, RepositoryResult, TaskRepository},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<TaskState>>,
}

#[derive(Debug, Default)]
struct TaskState {
    tasks: HashMap<TaskId, ProjectTask>,
    project_index: HashMap<ProjectId, Vec<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the task is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn contains(&self, id: TaskId) -> RepositoryResult<bool> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.tasks.contains_key(&id))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &ProjectTask) -> RepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        if state.tasks.contains_key(&task.id()) {
            return Err(RepositoryError::persistence(std::io::Error::other(format!(
                "duplicate task identifier: {}",
                task.id()
            ))));
        }
        if let Some(project_id) = task.project_id() {
            state
                .project_index
                .entry(project_id)
                .or_default()
                .push(task.id());
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<ProjectTask>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state
            .project_index
            .get(&project_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn remove(&self, id: TaskId) -> RepositoryResult<bool> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        let Some(task) = state.tasks.remove(&id) else {
            return Ok(false);
        };
        if let Some(project_id) = task.project_id()
            && let Some(ids) = state.project_index.get_mut(&project_id)
        {
            ids.retain(|candidate| *candidate != id);
            if ids.is_empty() {
                state.project_index.remove(&project_id);
            }
        }
        Ok(true)
    }
}
