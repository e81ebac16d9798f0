//! Shared world state for project membership BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use coterie::membership::{
    adapters::memory::{
        InMemoryMembershipRepository, InMemoryProjectRepository, InMemoryTagLinks,
        InMemoryTaskRepository, InMemoryUserRepository,
    },
    domain::{Login, ProjectId, TaskId, User, UserId},
    services::{
        ActingUser, DepartureOutcome, MembershipPorts, MembershipServiceError,
        ProjectMembershipService,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestMembershipService = ProjectMembershipService<
    InMemoryUserRepository,
    InMemoryProjectRepository,
    InMemoryMembershipRepository,
    InMemoryTaskRepository,
    InMemoryTagLinks,
    DefaultClock,
>;

/// Scenario world for project membership behaviour tests.
pub struct MembershipWorld {
    pub ports: MembershipPorts<
        InMemoryUserRepository,
        InMemoryProjectRepository,
        InMemoryMembershipRepository,
        InMemoryTaskRepository,
        InMemoryTagLinks,
    >,
    clock: Arc<DefaultClock>,
    users: HashMap<String, UserId>,
    pub projects: HashMap<String, ProjectId>,
    pub tasks: HashMap<String, TaskId>,
    pub last_create_result: Option<Result<ProjectId, MembershipServiceError>>,
    pub last_departure: Option<Result<DepartureOutcome, MembershipServiceError>>,
}

impl MembershipWorld {
    /// Creates a world with empty stores and no registered users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ports: MembershipPorts {
                users: Arc::new(InMemoryUserRepository::new()),
                projects: Arc::new(InMemoryProjectRepository::new()),
                memberships: Arc::new(InMemoryMembershipRepository::new()),
                tasks: Arc::new(InMemoryTaskRepository::new()),
                tags: Arc::new(InMemoryTagLinks::new()),
            },
            clock: Arc::new(DefaultClock),
            users: HashMap::new(),
            projects: HashMap::new(),
            tasks: HashMap::new(),
            last_create_result: None,
            last_departure: None,
        }
    }

    /// Registers a user under `login`.
    pub fn register(&mut self, login: &str) -> Result<(), eyre::Report> {
        let user = User::new(UserId::new(), Login::new(login)?);
        self.users.insert(login.to_owned(), user.id());
        self.ports.users.insert(user)?;
        Ok(())
    }

    /// Builds a service acting for the registered user `login`.
    pub fn service_for(&self, login: &str) -> Result<TestMembershipService, eyre::Report> {
        let user_id = self
            .users
            .get(login)
            .copied()
            .ok_or_else(|| eyre::eyre!("user '{login}' is not registered in this scenario"))?;
        Ok(ProjectMembershipService::new(
            ActingUser::new(user_id),
            self.ports.clone(),
            Arc::clone(&self.clock),
        ))
    }

    /// Returns the identifier of a project created earlier in the scenario.
    pub fn project(&self, name: &str) -> Result<ProjectId, eyre::Report> {
        self.projects
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("project '{name}' was not created in this scenario"))
    }

    /// Returns the identifier of a task filed earlier in the scenario.
    pub fn task(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("task '{title}' was not filed in this scenario"))
    }
}

impl Default for MembershipWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MembershipWorld {
    MembershipWorld::default()
}

/// Splits a comma-separated login list, ignoring blanks.
pub fn split_logins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|login| !login.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
