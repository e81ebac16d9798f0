//! Application services for project membership orchestration.

mod membership;

pub use membership::{
    ActingUser, DepartureOutcome, InviteTarget, MembershipPorts, MembershipServiceError,
    MembershipServiceResult, ProjectMembershipService,
};
