//! When steps for project membership BDD scenarios.

use super::world::{MembershipWorld, run_async, split_logins};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#""{creator}" creates the project "{name}" inviting "{logins}""#)]
fn create_project(
    world: &mut MembershipWorld,
    creator: String,
    name: String,
    logins: String,
) -> Result<(), eyre::Report> {
    let service = world.service_for(&creator)?;
    let result = run_async(service.create_project(name.as_str(), split_logins(&logins)));
    if let Ok(project_id) = &result {
        world.projects.insert(name, *project_id);
    }
    world.last_create_result = Some(result);
    Ok(())
}

#[when(r#""{login}" accepts the invitation to "{name}""#)]
fn accept_invitation(
    world: &mut MembershipWorld,
    login: String,
    name: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let service = world.service_for(&login)?;
    run_async(service.accept_invitation(project_id)).wrap_err("accept invitation")?;
    Ok(())
}

#[when(r#""{login}" declines the invitation to "{name}""#)]
fn decline_invitation(
    world: &mut MembershipWorld,
    login: String,
    name: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let service = world.service_for(&login)?;
    world.last_departure = Some(run_async(service.decline_invitation(project_id)));
    Ok(())
}

#[when(r#""{login}" leaves "{name}""#)]
fn leave_project(
    world: &mut MembershipWorld,
    login: String,
    name: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project(&name)?;
    let service = world.service_for(&login)?;
    world.last_departure = Some(run_async(service.leave_project(project_id)));
    Ok(())
}
