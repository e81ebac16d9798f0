//! Domain model for shared-project membership.
//!
//! Covers users, projects, their tasks, and the membership rows that act
//! both as invitations and as active memberships. Everything here is pure;
//! persistence lives behind the ports.

mod error;
mod ids;
mod membership;
mod project;
mod user;
mod views;

pub use error::{MembershipDomainError, ParseMembershipStatusError};
pub use ids::{ProjectId, TaskId, UserId};
pub use membership::{Membership, MembershipStatus, PersistedMembershipData};
pub use project::{Project, ProjectName, ProjectTask};
pub use user::{Login, User};
pub use views::{InvitationSummary, ProjectSummary};
