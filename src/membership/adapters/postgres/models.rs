//! Diesel row models and their domain conversions.

use super::schema::{project_memberships, projects, tasks, users};
use crate::membership::{
    domain::{
        Login, Membership, MembershipStatus, PersistedMembershipData, Project, ProjectId,
        ProjectName, ProjectTask, TaskId, User, UserId,
    },
    ports::{RepositoryError, RepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result row for users.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: Uuid,
    /// Unique login.
    pub login: String,
}

/// Row model for projects, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row model for membership rows, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = project_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    /// Project the row belongs to.
    pub project_id: Uuid,
    /// Member or invitee.
    pub user_id: Uuid,
    /// User who created the row.
    pub inviter_id: Uuid,
    /// Storage form of [`MembershipStatus`].
    pub status: String,
    /// Row creation timestamp.
    pub invited_at: DateTime<Utc>,
    /// Acceptance timestamp.
    pub responded_at: Option<DateTime<Utc>>,
}

/// Row model for tasks, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Option<Uuid>,
    /// Task title.
    pub title: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> RepositoryResult<Self> {
        let login = Login::new(row.login).map_err(RepositoryError::persistence)?;
        Ok(Self::new(UserId::from_uuid(row.id), login))
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id().into_inner(),
            name: project.name().as_str().to_owned(),
            created_at: project.created_at(),
        }
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> RepositoryResult<Self> {
        let name = ProjectName::new(row.name).map_err(RepositoryError::persistence)?;
        Ok(Self::from_persisted(
            ProjectId::from_uuid(row.id),
            name,
            row.created_at,
        ))
    }
}

impl From<&Membership> for MembershipRow {
    fn from(membership: &Membership) -> Self {
        Self {
            project_id: membership.project_id().into_inner(),
            user_id: membership.user_id().into_inner(),
            inviter_id: membership.inviter_id().into_inner(),
            status: membership.status().as_str().to_owned(),
            invited_at: membership.invited_at(),
            responded_at: membership.responded_at(),
        }
    }
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RepositoryError;

    fn try_from(row: MembershipRow) -> RepositoryResult<Self> {
        let status =
            MembershipStatus::try_from(row.status.as_str()).map_err(RepositoryError::persistence)?;
        Ok(Self::from_persisted(PersistedMembershipData {
            project_id: ProjectId::from_uuid(row.project_id),
            user_id: UserId::from_uuid(row.user_id),
            inviter_id: UserId::from_uuid(row.inviter_id),
            status,
            invited_at: row.invited_at,
            responded_at: row.responded_at,
        }))
    }
}

impl From<&ProjectTask> for TaskRow {
    fn from(task: &ProjectTask) -> Self {
        Self {
            id: task.id().into_inner(),
            project_id: task.project_id().map(ProjectId::into_inner),
            title: task.title().to_owned(),
        }
    }
}

impl From<TaskRow> for ProjectTask {
    fn from(row: TaskRow) -> Self {
        Self::new(
            TaskId::from_uuid(row.id),
            row.project_id.map(ProjectId::from_uuid),
            row.title,
        )
    }
}
