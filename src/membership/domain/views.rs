//! Read models handed to the presentation layer.

use super::{Login, ProjectId, ProjectName};
use serde::{Deserialize, Serialize};

/// A project the acting user is an accepted member of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Project identifier.
    pub id: ProjectId,
    /// Project display name.
    pub name: ProjectName,
}

/// A pending invitation addressed to the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationSummary {
    /// Login of the user who sent the invitation.
    pub inviter_login: Login,
    /// Project the invitation is for.
    pub project_id: ProjectId,
    /// Display name of that project.
    pub project_name: ProjectName,
}
