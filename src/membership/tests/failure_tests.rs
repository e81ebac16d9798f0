//! Storage failures part-way through a workflow: what was written before
//! the failure stays written, and nothing after it is attempted.

use super::fixtures::{Workspace, workspace};
use crate::membership::{
    adapters::memory::{InMemoryMembershipRepository, InMemoryTaskRepository},
    domain::{
        Membership, MembershipStatus, Project, ProjectId, ProjectName, ProjectTask, TaskId,
        UserId,
    },
    ports::{
        MembershipRepository, MockProjectRepository, ProjectRepository, RepositoryError,
        RepositoryResult, TaskRepository,
    },
    services::MembershipServiceError,
};
use async_trait::async_trait;
use rstest::rstest;
use std::sync::Arc;

fn storage_down() -> RepositoryError {
    RepositoryError::persistence(std::io::Error::other("storage unavailable"))
}

/// Membership store that refuses to write rows for one user.
struct RejectingMemberships {
    inner: Arc<InMemoryMembershipRepository>,
    rejected: UserId,
}

#[async_trait]
impl MembershipRepository for RejectingMemberships {
    async fn store(&self, membership: &Membership) -> RepositoryResult<()> {
        if membership.user_id() == self.rejected {
            return Err(storage_down());
        }
        self.inner.store(membership).await
    }

    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Membership>> {
        self.inner.find(project_id, user_id).await
    }

    async fn update(&self, membership: &Membership) -> RepositoryResult<()> {
        self.inner.update(membership).await
    }

    async fn remove(&self, project_id: ProjectId, user_id: UserId) -> RepositoryResult<bool> {
        self.inner.remove(project_id, user_id).await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        status: MembershipStatus,
    ) -> RepositoryResult<Vec<Membership>> {
        self.inner.list_for_user(user_id, status).await
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
        status: Option<MembershipStatus>,
    ) -> RepositoryResult<Vec<Membership>> {
        self.inner.list_for_project(project_id, status).await
    }

    async fn exists_for_project(&self, project_id: ProjectId) -> RepositoryResult<bool> {
        self.inner.exists_for_project(project_id).await
    }
}

/// Task store whose deletes fail for one task.
struct RejectingTasks {
    inner: Arc<InMemoryTaskRepository>,
    rejected: TaskId,
}

#[async_trait]
impl TaskRepository for RejectingTasks {
    async fn store(&self, task: &ProjectTask) -> RepositoryResult<()> {
        self.inner.store(task).await
    }

    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<ProjectTask>> {
        self.inner.list_for_project(project_id).await
    }

    async fn remove(&self, id: TaskId) -> RepositoryResult<bool> {
        if id == self.rejected {
            return Err(storage_down());
        }
        self.inner.remove(id).await
    }
}

async fn stored_project(workspace: &Workspace) -> ProjectId {
    let project = Project::new(
        ProjectName::new("Sprint").expect("valid name"),
        &*workspace.clock,
    );
    workspace.projects.store(&project).await.expect("store project");
    project.id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn earlier_invitations_survive_a_failed_store(workspace: Workspace) {
    let project_id = stored_project(&workspace).await;
    let (bob, carol) = (workspace.user_id("bob"), workspace.user_id("carol"));
    let alice = workspace.service_with_memberships(
        "alice",
        RejectingMemberships {
            inner: Arc::clone(&workspace.memberships),
            rejected: carol,
        },
    );

    let result = alice.invite_users(project_id, ["bob", "carol"]).await;

    assert!(matches!(
        result,
        Err(MembershipServiceError::Repository(RepositoryError::Persistence(_)))
    ));
    let kept = workspace
        .memberships
        .find(project_id, bob)
        .await
        .expect("lookup")
        .expect("bob's invitation is kept");
    assert_eq!(kept.status(), MembershipStatus::Pending);
    assert!(
        workspace
            .memberships
            .find(project_id, carol)
            .await
            .expect("lookup")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_project_insert_writes_no_memberships(workspace: Workspace) {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_store()
        .times(1)
        .returning(|_| Err(storage_down()));
    let alice = workspace.service_with_projects("alice", projects);

    let result = alice.create_project("Sprint", ["bob", "carol"]).await;

    assert!(matches!(
        result,
        Err(MembershipServiceError::Repository(RepositoryError::Persistence(_)))
    ));
    assert!(workspace.memberships.snapshot().expect("rows").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_task_removal_keeps_earlier_deletions(workspace: Workspace) {
    let project_id = workspace
        .service_for("alice")
        .create_project("Sprint", Vec::<String>::new())
        .await
        .expect("project creation should succeed");
    workspace.add_task(project_id, "Plan", &["urgent"]).await;
    workspace.add_task(project_id, "Review", &[]).await;
    let listed = workspace
        .tasks
        .list_for_project(project_id)
        .await
        .expect("list tasks");
    let (removed, rejected) = (listed[0].id(), listed[1].id());
    let alice = workspace.service_with_tasks(
        "alice",
        RejectingTasks {
            inner: Arc::clone(&workspace.tasks),
            rejected,
        },
    );

    let result = alice.leave_project(project_id).await;

    assert!(matches!(
        result,
        Err(MembershipServiceError::Repository(RepositoryError::Persistence(_)))
    ));
    assert!(!workspace.tasks.contains(removed).expect("contains"));
    assert!(workspace.tags.tags_of(removed).expect("tags").is_empty());
    assert!(workspace.tasks.contains(rejected).expect("contains"));
    assert!(
        workspace
            .projects
            .find_by_id(project_id)
            .await
            .expect("lookup")
            .is_some()
    );
}
