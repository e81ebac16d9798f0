//! Then steps for project membership BDD scenarios.

use super::world::{MembershipWorld, run_async, split_logins};
use coterie::membership::{
    ports::ProjectRepository,
    services::{DepartureOutcome, MembershipServiceError},
};
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then(r#""{login}" has a pending invitation to "{name}" from "{inviter}""#)]
fn pending_invitation_from(
    world: &MembershipWorld,
    login: String,
    name: String,
    inviter: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let invitations = run_async(world.service_for(&login)?.invitations())
        .wrap_err("list invitations")?;
    let found = invitations.iter().any(|invitation| {
        invitation.project_id == project_id
            && invitation.project_name.as_str() == name
            && invitation.inviter_login.as_str() == inviter
    });
    if !found {
        return Err(eyre::eyre!(
            "expected an invitation to {name} from {inviter}, found {invitations:?}"
        ));
    }
    Ok(())
}

#[then(r#""{login}" still has a pending invitation to "{name}""#)]
fn still_pending(
    world: &MembershipWorld,
    login: String,
    name: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let invitations = run_async(world.service_for(&login)?.invitations())
        .wrap_err("list invitations")?;
    if !invitations
        .iter()
        .any(|invitation| invitation.project_id == project_id)
    {
        return Err(eyre::eyre!("expected {login} to still be invited to {name}"));
    }
    Ok(())
}

#[then(r#""{login}" has no invitations"#)]
fn no_invitations(world: &MembershipWorld, login: String) -> Result<(), eyre::Report> {
    let invitations = run_async(world.service_for(&login)?.invitations())
        .wrap_err("list invitations")?;
    if !invitations.is_empty() {
        return Err(eyre::eyre!("expected no invitations, found {invitations:?}"));
    }
    Ok(())
}

#[then(r#"the members of "{name}" are "{logins}""#)]
fn members_are(world: &MembershipWorld, name: String, logins: String) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let mut expected = split_logins(&logins);
    expected.sort();
    let viewer = expected
        .first()
        .ok_or_else(|| eyre::eyre!("member list must not be empty"))?;
    let members = run_async(world.service_for(viewer)?.project_members(project_id))
        .wrap_err("list project members")?;
    let mut actual: Vec<String> = members
        .iter()
        .map(|login| login.as_str().to_owned())
        .collect();
    actual.sort();
    if actual != expected {
        return Err(eyre::eyre!("expected members {expected:?}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#""{login}" is a member of "{name}""#)]
fn is_member_of(world: &MembershipWorld, login: String, name: String) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let projects =
        run_async(world.service_for(&login)?.projects()).wrap_err("list projects")?;
    if !projects.iter().any(|project| project.id == project_id) {
        return Err(eyre::eyre!("expected {login} to be a member of {name}"));
    }
    Ok(())
}

#[then(r#"the request fails because "{login}" is not a registered user"#)]
fn unknown_user_failure(world: &MembershipWorld, login: String) -> Result<(), eyre::Report> {
    let result = world
        .last_create_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing create result in scenario world"))?;
    match result {
        Err(MembershipServiceError::UnknownUser(unknown)) if unknown.as_str() == login => Ok(()),
        other => Err(eyre::eyre!(
            "expected unknown user error for {login}, got {other:?}"
        )),
    }
}

#[then("no project exists")]
fn no_project_exists(world: &MembershipWorld) -> Result<(), eyre::Report> {
    if !world.ports.projects.is_empty()? {
        return Err(eyre::eyre!("expected no stored projects"));
    }
    Ok(())
}

#[then(r#"the project "{name}" is deleted with {count:usize} task"#)]
fn project_deleted(
    world: &MembershipWorld,
    name: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let outcome = world
        .last_departure
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing departure result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected departure failure: {err}"))?;
    if *outcome != (DepartureOutcome::ProjectDeleted { tasks_removed: count }) {
        return Err(eyre::eyre!("expected project deletion, got {outcome:?}"));
    }
    let project_id = world.project(&name)?;
    if run_async(world.ports.projects.find_by_id(project_id))?.is_some() {
        return Err(eyre::eyre!("project {name} is still stored"));
    }
    Ok(())
}

#[then(r#"the task "{title}" and its tags are gone"#)]
fn task_and_tags_gone(world: &MembershipWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    if world.ports.tasks.contains(task_id)? {
        return Err(eyre::eyre!("task {title} is still stored"));
    }
    if !world.ports.tags.tags_of(task_id)?.is_empty() {
        return Err(eyre::eyre!("task {title} still has tag links"));
    }
    Ok(())
}

#[then(r#""{name}" still exists"#)]
fn project_still_exists(world: &MembershipWorld, name: String) -> Result<(), eyre::Report> {
    let outcome = world
        .last_departure
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing departure result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected departure failure: {err}"))?;
    if *outcome != DepartureOutcome::Left {
        return Err(eyre::eyre!("expected the project to survive, got {outcome:?}"));
    }
    let project_id = world.project(&name)?;
    if run_async(world.ports.projects.find_by_id(project_id))?.is_none() {
        return Err(eyre::eyre!("project {name} was deleted"));
    }
    Ok(())
}
