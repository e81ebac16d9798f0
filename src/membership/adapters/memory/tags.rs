//! In-memory task-to-tag links standing in for the tag service.

use crate::membership::{
    domain::TaskId,
    ports::{TagCleanup, TagCleanupError},
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe in-memory tag association table.
///
/// Cleanup can be made to fail for chosen tasks, which lets callers
/// exercise partial teardown.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTagLinks {
    state: Arc<RwLock<TagState>>,
}

#[derive(Debug, Default)]
struct TagState {
    links: HashMap<TaskId, BTreeSet<String>>,
    failing: HashSet<TaskId>,
}

impl InMemoryTagLinks {
    /// Creates an empty link table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `tag` to `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TagCleanupError`] when the state lock is poisoned.
    pub fn attach(&self, task_id: TaskId, tag: impl Into<String>) -> Result<(), TagCleanupError> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        state.links.entry(task_id).or_default().insert(tag.into());
        Ok(())
    }

    /// Returns the tags attached to `task_id`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`TagCleanupError`] when the state lock is poisoned.
    pub fn tags_of(&self, task_id: TaskId) -> Result<Vec<String>, TagCleanupError> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state
            .links
            .get(&task_id)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Makes every later cleanup of `task_id` fail.
    ///
    /// # Errors
    ///
    /// Returns [`TagCleanupError`] when the state lock is poisoned.
    pub fn reject_cleanup_for(&self, task_id: TaskId) -> Result<(), TagCleanupError> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        state.failing.insert(task_id);
        Ok(())
    }

    /// Lets cleanup of `task_id` succeed again.
    ///
    /// # Errors
    ///
    /// Returns [`TagCleanupError`] when the state lock is poisoned.
    pub fn allow_cleanup_for(&self, task_id: TaskId) -> Result<(), TagCleanupError> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        state.failing.remove(&task_id);
        Ok(())
    }
}

#[async_trait]
impl TagCleanup for InMemoryTagLinks {
    async fn remove_tags_from_task(&self, task_id: TaskId) -> Result<(), TagCleanupError> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        if state.failing.contains(&task_id) {
            return Err(TagCleanupError::new(std::io::Error::other(format!(
                "tag store refused to unlink task {task_id}"
            ))));
        }
        state.links.remove(&task_id);
        Ok(())
    }
}

fn poisoned<T>(err: &PoisonError<T>) -> TagCleanupError {
    TagCleanupError::new(std::io::Error::other(err.to_string()))
}
