//! `PostgreSQL` implementations of the membership ports.

use super::{
    models::{MembershipRow, ProjectRow, TaskRow, UserRow},
    schema::{project_memberships, projects, task_tags, tasks, users},
};
use crate::membership::{
    domain::{
        Login, Membership, MembershipStatus, Project, ProjectId, ProjectTask, TaskId, User, UserId,
    },
    ports::{
        AtomicTeardown, MembershipRepository, ProjectRepository, RepositoryError,
        RepositoryResult, TagCleanup, TagCleanupError, TaskRepository, UserRepository,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by membership adapters.
pub type MembershipPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store implementing every membership repository port.
///
/// The composite primary key on `project_memberships` enforces one row per
/// project and user, so concurrent invitations of the same login cannot
/// both succeed.
#[derive(Debug, Clone)]
pub struct PostgresMembershipStore {
    pool: MembershipPgPool,
}

impl PostgresMembershipStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MembershipPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, f).await
    }
}

async fn run_blocking<F, T>(pool: &MembershipPgPool, f: F) -> RepositoryResult<T>
where
    F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(RepositoryError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(RepositoryError::persistence)?
}

fn uuids<I: Copy + AsRef<Uuid>>(ids: &[I]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_ref()).collect()
}

#[async_trait]
impl UserRepository for PostgresMembershipStore {
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::id.eq(id.into_inner()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(RepositoryError::persistence)?;
            row.map(User::try_from).transpose()
        })
        .await
    }

    async fn find_by_login(&self, login: &Login) -> RepositoryResult<Option<User>> {
        let lookup = login.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::login.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(RepositoryError::persistence)?;
            row.map(User::try_from).transpose()
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let lookup = uuids(ids);
        self.run_blocking(move |connection| {
            users::table
                .filter(users::id.eq_any(lookup))
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(RepositoryError::persistence)?
                .into_iter()
                .map(User::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl ProjectRepository for PostgresMembershipStore {
    async fn store(&self, project: &Project) -> RepositoryResult<()> {
        let row = ProjectRow::from(project);
        self.run_blocking(move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)
                .map_err(RepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .filter(projects::id.eq(id.into_inner()))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(RepositoryError::persistence)?;
            row.map(Project::try_from).transpose()
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[ProjectId]) -> RepositoryResult<Vec<Project>> {
        let lookup = uuids(ids);
        self.run_blocking(move |connection| {
            projects::table
                .filter(projects::id.eq_any(lookup))
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)
                .map_err(RepositoryError::persistence)?
                .into_iter()
                .map(Project::try_from)
                .collect()
        })
        .await
    }

    async fn remove(&self, id: ProjectId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(projects::table.filter(projects::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(RepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn delete_if_abandoned(&self, project_id: ProjectId) -> RepositoryResult<AtomicTeardown> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| delete_abandoned(tx, project_id))
        })
        .await
    }
}

/// Tears down `project_id` inside the caller's transaction.
///
/// The project row is locked first. Inserting a membership takes a key
/// share lock on it for the foreign key check, so no invitation can land
/// between the emptiness check and the deletes.
fn delete_abandoned(
    tx: &mut PgConnection,
    project_id: ProjectId,
) -> RepositoryResult<AtomicTeardown> {
    let id = project_id.into_inner();
    projects::table
        .find(id)
        .select(projects::id)
        .for_update()
        .first::<Uuid>(tx)
        .optional()?;

    let referenced = diesel::select(diesel::dsl::exists(
        project_memberships::table.filter(project_memberships::project_id.eq(id)),
    ))
    .get_result::<bool>(tx)?;
    if referenced {
        return Ok(AtomicTeardown::Retained);
    }

    let project_tasks = tasks::table
        .filter(tasks::project_id.eq(id))
        .select(tasks::id);
    let tags_removed =
        diesel::delete(task_tags::table.filter(task_tags::task_id.eq_any(project_tasks)))
            .execute(tx)?;
    let tasks_removed = diesel::delete(tasks::table.filter(tasks::project_id.eq(id))).execute(tx)?;
    diesel::delete(projects::table.find(id)).execute(tx)?;
    debug!(
        %project_id,
        tags_removed,
        tasks_removed,
        "abandoned project deleted in one transaction"
    );
    Ok(AtomicTeardown::Deleted { tasks_removed })
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipStore {
    async fn store(&self, membership: &Membership) -> RepositoryResult<()> {
        let row = MembershipRow::from(membership);
        let project_id = membership.project_id();
        let user_id = membership.user_id();
        self.run_blocking(move |connection| {
            diesel::insert_into(project_memberships::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        debug!(%project_id, %user_id, "membership insert hit primary key");
                        RepositoryError::DuplicateMembership {
                            project_id,
                            user_id,
                        }
                    }
                    _ => RepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Membership>> {
        self.run_blocking(move |connection| {
            let row = project_memberships::table
                .find((project_id.into_inner(), user_id.into_inner()))
                .select(MembershipRow::as_select())
                .first::<MembershipRow>(connection)
                .optional()
                .map_err(RepositoryError::persistence)?;
            row.map(Membership::try_from).transpose()
        })
        .await
    }

    async fn update(&self, membership: &Membership) -> RepositoryResult<()> {
        let project_id = membership.project_id();
        let user_id = membership.user_id();
        let status = membership.status().as_str();
        let responded_at = membership.responded_at();
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                project_memberships::table.find((project_id.into_inner(), user_id.into_inner())),
            )
            .set((
                project_memberships::status.eq(status),
                project_memberships::responded_at.eq(responded_at),
            ))
            .execute(connection)
            .map_err(RepositoryError::persistence)?;
            if updated == 0 {
                return Err(RepositoryError::MembershipNotFound {
                    project_id,
                    user_id,
                });
            }
            Ok(())
        })
        .await
    }

    async fn remove(&self, project_id: ProjectId, user_id: UserId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                project_memberships::table.find((project_id.into_inner(), user_id.into_inner())),
            )
            .execute(connection)
            .map_err(RepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        status: MembershipStatus,
    ) -> RepositoryResult<Vec<Membership>> {
        self.run_blocking(move |connection| {
            project_memberships::table
                .filter(project_memberships::user_id.eq(user_id.into_inner()))
                .filter(project_memberships::status.eq(status.as_str()))
                .order((
                    project_memberships::invited_at.asc(),
                    project_memberships::project_id.asc(),
                ))
                .select(MembershipRow::as_select())
                .load::<MembershipRow>(connection)
                .map_err(RepositoryError::persistence)?
                .into_iter()
                .map(Membership::try_from)
                .collect()
        })
        .await
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
        status: Option<MembershipStatus>,
    ) -> RepositoryResult<Vec<Membership>> {
        self.run_blocking(move |connection| {
            let mut query = project_memberships::table
                .filter(project_memberships::project_id.eq(project_id.into_inner()))
                .select(MembershipRow::as_select())
                .order((
                    project_memberships::invited_at.asc(),
                    project_memberships::user_id.asc(),
                ))
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(project_memberships::status.eq(wanted.as_str()));
            }
            query
                .load::<MembershipRow>(connection)
                .map_err(RepositoryError::persistence)?
                .into_iter()
                .map(Membership::try_from)
                .collect()
        })
        .await
    }

    async fn exists_for_project(&self, project_id: ProjectId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            diesel::select(diesel::dsl::exists(
                project_memberships::table
                    .filter(project_memberships::project_id.eq(project_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(RepositoryError::persistence)
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for PostgresMembershipStore {
    async fn store(&self, task: &ProjectTask) -> RepositoryResult<()> {
        let row = TaskRow::from(task);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(RepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<ProjectTask>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(RepositoryError::persistence)?;
            Ok(rows.into_iter().map(ProjectTask::from).collect())
        })
        .await
    }

    async fn remove(&self, id: TaskId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(RepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

/// `PostgreSQL`-backed tag cleanup over the `task_tags` table.
#[derive(Debug, Clone)]
pub struct PostgresTagLinks {
    pool: MembershipPgPool,
}

impl PostgresTagLinks {
    /// Creates a tag cleanup adapter from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MembershipPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagCleanup for PostgresTagLinks {
    async fn remove_tags_from_task(&self, task_id: TaskId) -> Result<(), TagCleanupError> {
        run_blocking(&self.pool, move |connection| {
            let removed =
                diesel::delete(task_tags::table.filter(task_tags::task_id.eq(task_id.into_inner())))
                    .execute(connection)
                    .map_err(RepositoryError::persistence)?;
            debug!(%task_id, removed, "unlinked task tags");
            Ok(())
        })
        .await
        .map_err(TagCleanupError::new)
    }
}
