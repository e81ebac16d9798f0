//! Repository ports for users, projects, memberships, and tasks.
//!
//! Each entity gets its own storage contract. Lookups take their predicate
//! as arguments so adapters can answer them with an index or a `WHERE`
//! clause instead of materialising whole tables.

use crate::membership::domain::{
    Login, Membership, MembershipStatus, Project, ProjectId, ProjectTask, TaskId, User, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read access to registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by identifier.
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Finds a user by exact login.
    async fn find_by_login(&self, login: &Login) -> RepositoryResult<Option<User>>;

    /// Returns the users among `ids` that exist, in no particular order.
    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>>;

    /// Reloads any cached state from the backing store.
    async fn refresh(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Project persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the store rejects the
    /// write.
    async fn store(&self, project: &Project) -> RepositoryResult<()>;

    /// Finds a project by identifier.
    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>>;

    /// Returns the projects among `ids` that exist, in no particular order.
    async fn find_by_ids(&self, ids: &[ProjectId]) -> RepositoryResult<Vec<Project>>;

    /// Removes a project. Returns `false` when it was already gone.
    async fn remove(&self, id: ProjectId) -> RepositoryResult<bool>;

    /// Deletes the project's tag links, then its tasks, then the project
    /// row as one unit, provided no membership row references the project.
    ///
    /// Stores that cannot do this atomically keep the default, which
    /// reports [`AtomicTeardown::Unsupported`] and leaves the caller to
    /// tear the project down step by step.
    async fn delete_if_abandoned(
        &self,
        _project_id: ProjectId,
    ) -> RepositoryResult<AtomicTeardown> {
        Ok(AtomicTeardown::Unsupported)
    }

    /// Reloads any cached state from the backing store.
    async fn refresh(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Membership persistence contract.
///
/// Implementations must enforce at most one row per `(project, user)` pair.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Stores a new membership row.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateMembership`] when a row for the
    /// same project and user already exists.
    async fn store(&self, membership: &Membership) -> RepositoryResult<()>;

    /// Finds the row linking `user_id` to `project_id`.
    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Membership>>;

    /// Persists in-place changes to an existing row.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MembershipNotFound`] when the row does not
    /// exist.
    async fn update(&self, membership: &Membership) -> RepositoryResult<()>;

    /// Removes the row linking `user_id` to `project_id`. Returns `false`
    /// when no such row existed.
    async fn remove(&self, project_id: ProjectId, user_id: UserId) -> RepositoryResult<bool>;

    /// Returns every row of `user_id` in the given state, oldest invitation
    /// first with ties broken by project identifier.
    async fn list_for_user(
        &self,
        user_id: UserId,
        status: MembershipStatus,
    ) -> RepositoryResult<Vec<Membership>>;

    /// Returns the rows of a project, optionally restricted to one state,
    /// oldest invitation first with ties broken by user identifier.
    async fn list_for_project(
        &self,
        project_id: ProjectId,
        status: Option<MembershipStatus>,
    ) -> RepositoryResult<Vec<Membership>>;

    /// Returns `true` when any row, pending or accepted, references the
    /// project.
    async fn exists_for_project(&self, project_id: ProjectId) -> RepositoryResult<bool>;

    /// Reloads any cached state from the backing store.
    async fn refresh(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Task persistence contract, reduced to what project teardown needs.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    async fn store(&self, task: &ProjectTask) -> RepositoryResult<()>;

    /// Returns every task filed under the project.
    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<ProjectTask>>;

    /// Removes a task. Returns `false` when it was already gone.
    async fn remove(&self, id: TaskId) -> RepositoryResult<bool>;

    /// Reloads any cached state from the backing store.
    async fn refresh(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Outcome of [`ProjectRepository::delete_if_abandoned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicTeardown {
    /// The store has no transactional teardown; nothing was touched.
    Unsupported,
    /// A membership row still references the project; nothing was deleted.
    Retained,
    /// Tag links, tasks, and the project row were deleted together.
    Deleted {
        /// Number of task rows deleted.
        tasks_removed: usize,
    },
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// A row for the same project and user already exists.
    #[error("user {user_id} already has a membership in project {project_id}")]
    DuplicateMembership {
        /// Project of the conflicting row.
        project_id: ProjectId,
        /// User of the conflicting row.
        user_id: UserId,
    },

    /// The membership row was not found.
    #[error("no membership for user {user_id} in project {project_id}")]
    MembershipNotFound {
        /// Requested project.
        project_id: ProjectId,
        /// Requested user.
        user_id: UserId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
