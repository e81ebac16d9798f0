//! Port to the tag service, used only to unlink tags before a task is
//! deleted.

use crate::membership::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Removes tag associations from tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagCleanup: Send + Sync {
    /// Removes every tag association of `task_id`.
    ///
    /// Succeeds when the task has no tags.
    ///
    /// # Errors
    ///
    /// Returns [`TagCleanupError`] when the associations could not be
    /// removed; the caller must not delete the task in that case.
    async fn remove_tags_from_task(&self, task_id: TaskId) -> Result<(), TagCleanupError>;
}

/// Failure reported by a [`TagCleanup`] implementation.
#[derive(Debug, Clone, Error)]
#[error("tag cleanup failed: {0}")]
pub struct TagCleanupError(Arc<dyn std::error::Error + Send + Sync>);

impl TagCleanupError {
    /// Wraps the underlying failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
