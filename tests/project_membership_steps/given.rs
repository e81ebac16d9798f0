//! Given steps for project membership BDD scenarios.

use super::world::{MembershipWorld, run_async, split_logins};
use coterie::membership::{
    domain::{ProjectTask, TaskId},
    ports::TaskRepository,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"the registered users "{logins}""#)]
fn registered_users(world: &mut MembershipWorld, logins: String) -> Result<(), eyre::Report> {
    for login in split_logins(&logins) {
        world.register(&login)?;
    }
    Ok(())
}

#[given(r#""{creator}" has created the project "{name}" inviting "{logins}""#)]
fn project_with_invitees(
    world: &mut MembershipWorld,
    creator: String,
    name: String,
    logins: String,
) -> Result<(), eyre::Report> {
    let service = world.service_for(&creator)?;
    let project_id = run_async(service.create_project(name.as_str(), split_logins(&logins)))
        .wrap_err("create project with invitees")?;
    world.projects.insert(name, project_id);
    Ok(())
}

#[given(r#""{creator}" has created the solo project "{name}""#)]
fn solo_project(
    world: &mut MembershipWorld,
    creator: String,
    name: String,
) -> Result<(), eyre::Report> {
    let service = world.service_for(&creator)?;
    let project_id = run_async(service.create_project(name.as_str(), Vec::<String>::new()))
        .wrap_err("create solo project")?;
    world.projects.insert(name, project_id);
    Ok(())
}

#[given(r#""{login}" has accepted the invitation to "{name}""#)]
fn invitation_accepted(
    world: &mut MembershipWorld,
    login: String,
    name: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let service = world.service_for(&login)?;
    run_async(service.accept_invitation(project_id)).wrap_err("accept invitation")?;
    Ok(())
}

#[given(r#""{name}" has a task "{title}" tagged "{tag}""#)]
fn project_task(
    world: &mut MembershipWorld,
    name: String,
    title: String,
    tag: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let task = ProjectTask::new(TaskId::new(), Some(project_id), title.as_str());
    run_async(world.ports.tasks.store(&task)).wrap_err("store task")?;
    world
        .ports
        .tags
        .attach(task.id(), tag)
        .wrap_err("attach tag")?;
    world.tasks.insert(title, task.id());
    Ok(())
}
