//! In-memory membership store keyed by `(project, user)`.

use super::poisoned;
use crate::membership::{
    domain::{Membership, MembershipStatus, ProjectId, UserId},
    ports::{MembershipRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

type MembershipKey = (ProjectId, UserId);

/// Thread-safe in-memory membership repository.
///
/// The composite key makes the one-row-per-pair invariant structural; the
/// write lock serialises concurrent check-then-insert sequences.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembershipRepository {
    state: Arc<RwLock<MembershipState>>,
}

#[derive(Debug, Default)]
struct MembershipState {
    rows: BTreeMap<MembershipKey, Membership>,
    user_index: HashMap<UserId, BTreeSet<ProjectId>>,
}

impl InMemoryMembershipRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored row, ordered by project then user.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn snapshot(&self) -> RepositoryResult<Vec<Membership>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.rows.values().cloned().collect())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn store(&self, membership: &Membership) -> RepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        let key = (membership.project_id(), membership.user_id());
        if state.rows.contains_key(&key) {
            return Err(RepositoryError::DuplicateMembership {
                project_id: key.0,
                user_id: key.1,
            });
        }
        state.user_index.entry(key.1).or_default().insert(key.0);
        state.rows.insert(key, membership.clone());
        Ok(())
    }

    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Membership>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.rows.get(&(project_id, user_id)).cloned())
    }

    async fn update(&self, membership: &Membership) -> RepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        let key = (membership.project_id(), membership.user_id());
        let row = state
            .rows
            .get_mut(&key)
            .ok_or(RepositoryError::MembershipNotFound {
                project_id: key.0,
                user_id: key.1,
            })?;
        *row = membership.clone();
        Ok(())
    }

    async fn remove(&self, project_id: ProjectId, user_id: UserId) -> RepositoryResult<bool> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        if state.rows.remove(&(project_id, user_id)).is_none() {
            return Ok(false);
        }
        if let Some(projects) = state.user_index.get_mut(&user_id) {
            projects.remove(&project_id);
            if projects.is_empty() {
                state.user_index.remove(&user_id);
            }
        }
        Ok(true)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        status: MembershipStatus,
    ) -> RepositoryResult<Vec<Membership>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        let Some(projects) = state.user_index.get(&user_id) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<Membership> = projects
            .iter()
            .filter_map(|project_id| state.rows.get(&(*project_id, user_id)))
            .filter(|row| row.status() == status)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.invited_at(), row.project_id()));
        Ok(rows)
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
        status: Option<MembershipStatus>,
    ) -> RepositoryResult<Vec<Membership>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        let mut rows: Vec<Membership> = project_rows(&state, project_id)
            .filter(|row| status.is_none_or(|wanted| row.status() == wanted))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.invited_at(), row.user_id()));
        Ok(rows)
    }

    async fn exists_for_project(&self, project_id: ProjectId) -> RepositoryResult<bool> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(project_rows(&state, project_id).next().is_some())
    }
}

/// Rows of one project, using the key ordering to avoid a full scan.
fn project_rows(
    state: &MembershipState,
    project_id: ProjectId,
) -> impl Iterator<Item = &Membership> {
    let lower = (project_id, UserId::from_uuid(uuid::Uuid::nil()));
    let upper = (project_id, UserId::from_uuid(uuid::Uuid::from_u128(u128::MAX)));
    state.rows.range(lower..=upper).map(|(_, row)| row)
}
