//! Service layer for shared-project membership and invitations.

use crate::membership::{
    domain::{
        InvitationSummary, Login, Membership, MembershipDomainError, MembershipStatus, Project,
        ProjectId, ProjectName, ProjectSummary, TaskId, User, UserId,
    },
    ports::{
        AtomicTeardown, MembershipRepository, ProjectRepository, RepositoryError, TagCleanup,
        TagCleanupError, TaskRepository, UserRepository,
    },
};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The user on whose behalf a service instance acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActingUser(UserId);

impl ActingUser {
    /// Binds a session to `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self(user_id)
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn id(self) -> UserId {
        self.0
    }
}

/// Where invited users should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteTarget {
    /// Create a project with this name; the acting user becomes its first
    /// member.
    NewProject(String),
    /// Invite into a project that already exists.
    Existing(ProjectId),
}

/// What happened to the project after the acting user's row was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureOutcome {
    /// Other rows remain; the project survives.
    Left,
    /// No rows remained, so the project and its tasks were deleted.
    ProjectDeleted {
        /// Number of tasks removed during teardown.
        tasks_removed: usize,
    },
}

/// Service-level errors for membership operations.
#[derive(Debug, Error)]
pub enum MembershipServiceError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] MembershipDomainError),

    /// An invited login does not belong to any user.
    #[error("unknown user login: {0}")]
    UnknownUser(Login),

    /// The acting user is not a registered user.
    #[error("acting user {0} does not exist")]
    UnknownActingUser(UserId),

    /// The creator listed their own login; creators join automatically.
    #[error("project creators are added automatically and cannot invite themselves")]
    SelfInvitation,

    /// The target project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The acting user has no membership row in the project.
    #[error("no membership or invitation in project {project_id}")]
    NotFound {
        /// Requested project.
        project_id: ProjectId,
    },

    /// The tag service could not unlink a task; teardown stopped before
    /// deleting it.
    #[error("could not remove tags from task {task_id}")]
    TagCleanup {
        /// Task whose tags are still linked.
        task_id: TaskId,
        /// Failure reported by the tag service.
        #[source]
        source: TagCleanupError,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for membership service operations.
pub type MembershipServiceResult<T> = Result<T, MembershipServiceError>;

/// Storage and collaborator handles used by [`ProjectMembershipService`].
pub struct MembershipPorts<U, P, M, T, G> {
    /// User directory.
    pub users: Arc<U>,
    /// Project store.
    pub projects: Arc<P>,
    /// Membership store.
    pub memberships: Arc<M>,
    /// Task store.
    pub tasks: Arc<T>,
    /// Tag service used during teardown.
    pub tags: Arc<G>,
}

impl<U, P, M, T, G> Clone for MembershipPorts<U, P, M, T, G> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            projects: Arc::clone(&self.projects),
            memberships: Arc::clone(&self.memberships),
            tasks: Arc::clone(&self.tasks),
            tags: Arc::clone(&self.tags),
        }
    }
}

/// Membership and invitation workflow for one acting user.
///
/// # Examples
///
/// ```ignore
/// let service = ProjectMembershipService::new(ActingUser::new(alice), ports, clock);
/// let project_id = service.create_project("Sprint", ["bob", "carol"]).await?;
/// ```
#[derive(Clone)]
pub struct ProjectMembershipService<U, P, M, T, G, C>
where
    U: UserRepository,
    P: ProjectRepository,
    M: MembershipRepository,
    T: TaskRepository,
    G: TagCleanup,
    C: Clock + Send + Sync,
{
    acting_user: ActingUser,
    ports: MembershipPorts<U, P, M, T, G>,
    clock: Arc<C>,
}

impl<U, P, M, T, G, C> ProjectMembershipService<U, P, M, T, G, C>
where
    U: UserRepository,
    P: ProjectRepository,
    M: MembershipRepository,
    T: TaskRepository,
    G: TagCleanup,
    C: Clock + Send + Sync,
{
    /// Creates a service acting on behalf of `acting_user`.
    #[must_use]
    pub const fn new(
        acting_user: ActingUser,
        ports: MembershipPorts<U, P, M, T, G>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            acting_user,
            ports,
            clock,
        }
    }

    /// Returns the user this service acts for.
    #[must_use]
    pub const fn acting_user(&self) -> ActingUser {
        self.acting_user
    }

    /// Creates a project or extends an existing one, inviting `logins`.
    ///
    /// Every login is validated and resolved before anything is written.
    /// For a new project the acting user becomes an accepted member and must
    /// not appear in `logins`. Logins that already have a row in the project
    /// are skipped.
    ///
    /// A storage failure after the project row was written leaves the rows
    /// created so far in place; invoking the call again against the returned
    /// project is safe.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::UnknownUser`] for an unregistered
    /// login, [`MembershipServiceError::SelfInvitation`] when the creator
    /// lists themselves, [`MembershipServiceError::ProjectNotFound`] for a
    /// missing existing project, and [`MembershipServiceError::Repository`]
    /// on storage failure.
    pub async fn create_or_invite<I, S>(
        &self,
        target: InviteTarget,
        logins: I,
    ) -> MembershipServiceResult<ProjectId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested = parse_logins(logins)?;
        let invitees = self.resolve_logins(&requested).await?;

        let project_id = match target {
            InviteTarget::Existing(project_id) => {
                if self.ports.projects.find_by_id(project_id).await?.is_none() {
                    return Err(MembershipServiceError::ProjectNotFound(project_id));
                }
                project_id
            }
            InviteTarget::NewProject(name) => self.found_project(name, &invitees).await?,
        };

        self.apply_invitations(project_id, &invitees).await?;
        Ok(project_id)
    }

    /// Creates a project named `name` and invites `logins` to it.
    ///
    /// # Errors
    ///
    /// See [`Self::create_or_invite`].
    pub async fn create_project<I, S>(
        &self,
        name: impl Into<String>,
        logins: I,
    ) -> MembershipServiceResult<ProjectId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.create_or_invite(InviteTarget::NewProject(name.into()), logins)
            .await
    }

    /// Invites `logins` to an existing project.
    ///
    /// # Errors
    ///
    /// See [`Self::create_or_invite`].
    pub async fn invite_users<I, S>(
        &self,
        project_id: ProjectId,
        logins: I,
    ) -> MembershipServiceResult<ProjectId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.create_or_invite(InviteTarget::Existing(project_id), logins)
            .await
    }

    /// Accepts the acting user's invitation to `project_id`.
    ///
    /// Accepting an already accepted membership changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::NotFound`] when the acting user has
    /// no row in the project, or [`MembershipServiceError::Repository`] on
    /// storage failure.
    pub async fn accept_invitation(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<Membership> {
        let user_id = self.acting_user.id();
        let mut membership = self
            .ports
            .memberships
            .find(project_id, user_id)
            .await?
            .ok_or(MembershipServiceError::NotFound { project_id })?;

        if membership.accept(&*self.clock) {
            self.ports.memberships.update(&membership).await?;
            info!(%project_id, %user_id, "invitation accepted");
        } else {
            debug!(%project_id, %user_id, "membership already accepted");
        }
        Ok(membership)
    }

    /// Declines the acting user's invitation to `project_id` by removing
    /// the row, whatever its state.
    ///
    /// When that was the project's last row the project is torn down as in
    /// [`Self::leave_project`].
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::NotFound`] when the acting user has
    /// no row in the project, and storage or tag-service failures as
    /// [`Self::leave_project`] does.
    pub async fn decline_invitation(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<DepartureOutcome> {
        let user_id = self.acting_user.id();
        if !self.ports.memberships.remove(project_id, user_id).await? {
            return Err(MembershipServiceError::NotFound { project_id });
        }
        info!(%project_id, %user_id, "invitation declined");
        self.teardown_if_abandoned(project_id).await
    }

    /// Removes the acting user from `project_id`.
    ///
    /// If no rows remain afterwards, every task of the project is deleted
    /// (tags first) and then the project itself. A failure part-way leaves
    /// the already-deleted tasks deleted; calling again resumes the
    /// teardown of the memberless project.
    ///
    /// Resuming is open to any acting user, including one who never
    /// belonged to the project: a project without rows has no members left
    /// to protect, and the row that was removed is not remembered.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::NotFound`] when the acting user is
    /// not in the project and there is no teardown to resume,
    /// [`MembershipServiceError::TagCleanup`] when the tag service fails for
    /// a task, or [`MembershipServiceError::Repository`] on storage failure.
    pub async fn leave_project(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<DepartureOutcome> {
        let user_id = self.acting_user.id();
        if self.ports.memberships.remove(project_id, user_id).await? {
            info!(%project_id, %user_id, "left project");
        } else if self.is_abandoned(project_id).await? {
            warn!(%project_id, "resuming teardown of memberless project");
        } else {
            return Err(MembershipServiceError::NotFound { project_id });
        }
        self.teardown_if_abandoned(project_id).await
    }

    /// Lists the projects the acting user is an accepted member of.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] on storage failure.
    pub async fn projects(&self) -> MembershipServiceResult<Vec<ProjectSummary>> {
        let rows = self
            .ports
            .memberships
            .list_for_user(self.acting_user.id(), MembershipStatus::Accepted)
            .await?;
        let projects = self.projects_by_id(&rows).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let project = lookup(&projects, row.project_id(), "project")?;
                Some(ProjectSummary {
                    id: project.id(),
                    name: project.name().clone(),
                })
            })
            .collect())
    }

    /// Lists the pending invitations addressed to the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] on storage failure.
    pub async fn invitations(&self) -> MembershipServiceResult<Vec<InvitationSummary>> {
        let rows = self
            .ports
            .memberships
            .list_for_user(self.acting_user.id(), MembershipStatus::Pending)
            .await?;
        let projects = self.projects_by_id(&rows).await?;
        let inviter_ids: Vec<UserId> = rows.iter().map(Membership::inviter_id).collect();
        let inviters = self.users_by_id(&inviter_ids).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let project = lookup(&projects, row.project_id(), "project")?;
                let inviter = lookup(&inviters, row.inviter_id(), "inviter")?;
                Some(InvitationSummary {
                    inviter_login: inviter.login().clone(),
                    project_id: project.id(),
                    project_name: project.name().clone(),
                })
            })
            .collect())
    }

    /// Lists the logins of the accepted members of `project_id`.
    ///
    /// An unknown project has no members.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] on storage failure.
    pub async fn project_members(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<Vec<Login>> {
        let rows = self
            .ports
            .memberships
            .list_for_project(project_id, Some(MembershipStatus::Accepted))
            .await?;
        let member_ids: Vec<UserId> = rows.iter().map(Membership::user_id).collect();
        let members = self.users_by_id(&member_ids).await?;

        Ok(member_ids
            .iter()
            .filter_map(|id| lookup(&members, *id, "member"))
            .map(|user| user.login().clone())
            .collect())
    }

    /// Reloads cached state in every repository.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when any repository
    /// fails to reload.
    pub async fn refresh_repositories(&self) -> MembershipServiceResult<()> {
        self.ports.tasks.refresh().await?;
        self.ports.users.refresh().await?;
        self.ports.projects.refresh().await?;
        self.ports.memberships.refresh().await?;
        Ok(())
    }

    async fn resolve_logins(&self, logins: &[Login]) -> MembershipServiceResult<Vec<User>> {
        let mut users = Vec::with_capacity(logins.len());
        for login in logins {
            let user = self
                .ports
                .users
                .find_by_login(login)
                .await?
                .ok_or_else(|| MembershipServiceError::UnknownUser(login.clone()))?;
            users.push(user);
        }
        Ok(users)
    }

    /// Writes the project row and the creator's accepted membership.
    async fn found_project(
        &self,
        name: String,
        invitees: &[User],
    ) -> MembershipServiceResult<ProjectId> {
        let name = ProjectName::new(name)?;
        let creator_id = self.acting_user.id();
        if self.ports.users.find_by_id(creator_id).await?.is_none() {
            return Err(MembershipServiceError::UnknownActingUser(creator_id));
        }
        if invitees.iter().any(|user| user.id() == creator_id) {
            return Err(MembershipServiceError::SelfInvitation);
        }

        let project = Project::new(name, &*self.clock);
        let project_id = project.id();
        self.ports.projects.store(&project).await?;
        self.ports
            .memberships
            .store(&Membership::founder(project_id, creator_id, &*self.clock))
            .await?;
        info!(%project_id, creator = %creator_id, name = %project.name(), "project created");
        Ok(project_id)
    }

    /// Stores a pending row for every invitee without one.
    async fn apply_invitations(
        &self,
        project_id: ProjectId,
        invitees: &[User],
    ) -> MembershipServiceResult<usize> {
        let inviter_id = self.acting_user.id();
        let mut created = 0_usize;
        for invitee in invitees {
            let invitee_id = invitee.id();
            if self
                .ports
                .memberships
                .find(project_id, invitee_id)
                .await?
                .is_some()
            {
                debug!(%project_id, login = %invitee.login(), "already invited, skipping");
                continue;
            }

            let invitation =
                Membership::invitation(project_id, invitee_id, inviter_id, &*self.clock);
            match self.ports.memberships.store(&invitation).await {
                Ok(()) => {
                    created += 1;
                    info!(
                        %project_id,
                        login = %invitee.login(),
                        inviter = %inviter_id,
                        "invitation sent"
                    );
                }
                Err(RepositoryError::DuplicateMembership { .. }) => {
                    debug!(%project_id, login = %invitee.login(), "invited concurrently, skipping");
                }
                Err(err) => {
                    warn!(%project_id, applied = created, error = %err, "invitation batch aborted");
                    return Err(err.into());
                }
            }
        }
        Ok(created)
    }

    async fn is_abandoned(&self, project_id: ProjectId) -> MembershipServiceResult<bool> {
        if self.ports.memberships.exists_for_project(project_id).await? {
            return Ok(false);
        }
        Ok(self.ports.projects.find_by_id(project_id).await?.is_some())
    }

    /// Deletes the project, its tasks, and their tag links when no rows
    /// reference it any more. Order is tags, then task, then project.
    ///
    /// A store with transactional teardown does all of it in one unit;
    /// otherwise each step is its own write and the tag service is called
    /// per task.
    async fn teardown_if_abandoned(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<DepartureOutcome> {
        match self.ports.projects.delete_if_abandoned(project_id).await? {
            AtomicTeardown::Retained => return Ok(DepartureOutcome::Left),
            AtomicTeardown::Deleted { tasks_removed } => {
                info!(%project_id, tasks_removed, "project deleted after its last member left");
                return Ok(DepartureOutcome::ProjectDeleted { tasks_removed });
            }
            AtomicTeardown::Unsupported => {}
        }

        if self.ports.memberships.exists_for_project(project_id).await? {
            return Ok(DepartureOutcome::Left);
        }

        let tasks = self.ports.tasks.list_for_project(project_id).await?;
        let mut tasks_removed = 0_usize;
        for task in &tasks {
            let task_id = task.id();
            if let Err(source) = self.ports.tags.remove_tags_from_task(task_id).await {
                warn!(%project_id, %task_id, tasks_removed, "teardown stopped: tag cleanup failed");
                return Err(MembershipServiceError::TagCleanup { task_id, source });
            }
            if self.ports.tasks.remove(task_id).await? {
                tasks_removed += 1;
            }
        }

        self.ports.projects.remove(project_id).await?;
        info!(%project_id, tasks_removed, "project deleted after its last member left");
        Ok(DepartureOutcome::ProjectDeleted { tasks_removed })
    }

    async fn projects_by_id(
        &self,
        rows: &[Membership],
    ) -> MembershipServiceResult<HashMap<ProjectId, Project>> {
        let ids: Vec<ProjectId> = rows.iter().map(Membership::project_id).collect();
        let projects = self.ports.projects.find_by_ids(&ids).await?;
        Ok(projects
            .into_iter()
            .map(|project| (project.id(), project))
            .collect())
    }

    async fn users_by_id(&self, ids: &[UserId]) -> MembershipServiceResult<HashMap<UserId, User>> {
        let users = self.ports.users.find_by_ids(ids).await?;
        Ok(users.into_iter().map(|user| (user.id(), user)).collect())
    }
}

/// Parses logins, dropping repeats while keeping first-seen order.
fn parse_logins<I, S>(logins: I) -> Result<Vec<Login>, MembershipDomainError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut parsed = Vec::new();
    for raw in logins {
        let login = Login::new(raw)?;
        if seen.insert(login.clone()) {
            parsed.push(login);
        }
    }
    Ok(parsed)
}

/// Looks a row's referent up, logging rows that point at nothing.
fn lookup<'a, K, V>(index: &'a HashMap<K, V>, key: K, kind: &str) -> Option<&'a V>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    let found = index.get(&key);
    if found.is_none() {
        warn!(%key, kind, "membership row references a missing record");
    }
    found
}
