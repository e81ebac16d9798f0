//! Project membership aggregate and its acceptance state machine.
//!
//! A membership row links one user to one project. While pending it is an
//! invitation; once accepted the user is a member. Rows move
//! `Pending -> Accepted` only; declining or leaving removes the row.

use super::{ParseMembershipStatusError, ProjectId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Acceptance state of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// The invitee has not answered yet.
    Pending,
    /// The user is an active member.
    Accepted,
}

impl MembershipStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    /// Returns `true` for [`MembershipStatus::Accepted`].
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl TryFrom<&str> for MembershipStatus {
    type Error = ParseMembershipStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseMembershipStatusError(value.to_owned())),
        }
    }
}

/// Join record between a project and a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    project_id: ProjectId,
    user_id: UserId,
    inviter_id: UserId,
    status: MembershipStatus,
    invited_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMembershipData {
    /// Project the row belongs to.
    pub project_id: ProjectId,
    /// Member or invitee.
    pub user_id: UserId,
    /// User who created the row.
    pub inviter_id: UserId,
    /// Persisted acceptance state.
    pub status: MembershipStatus,
    /// When the row was created.
    pub invited_at: DateTime<Utc>,
    /// When the row was accepted, if it has been.
    pub responded_at: Option<DateTime<Utc>>,
}

impl Membership {
    /// Creates the accepted membership of a project's creator.
    #[must_use]
    pub fn founder(project_id: ProjectId, user_id: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            project_id,
            user_id,
            inviter_id: user_id,
            status: MembershipStatus::Accepted,
            invited_at: timestamp,
            responded_at: Some(timestamp),
        }
    }

    /// Creates a pending invitation sent by `inviter_id` to `invitee_id`.
    #[must_use]
    pub fn invitation(
        project_id: ProjectId,
        invitee_id: UserId,
        inviter_id: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            project_id,
            user_id: invitee_id,
            inviter_id,
            status: MembershipStatus::Pending,
            invited_at: clock.utc(),
            responded_at: None,
        }
    }

    /// Reconstructs a membership from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedMembershipData) -> Self {
        Self {
            project_id: data.project_id,
            user_id: data.user_id,
            inviter_id: data.inviter_id,
            status: data.status,
            invited_at: data.invited_at,
            responded_at: data.responded_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the member or invitee.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the user who created this row.
    #[must_use]
    pub const fn inviter_id(&self) -> UserId {
        self.inviter_id
    }

    /// Returns the acceptance state.
    #[must_use]
    pub const fn status(&self) -> MembershipStatus {
        self.status
    }

    /// Returns `true` once the invitation has been accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn invited_at(&self) -> DateTime<Utc> {
        self.invited_at
    }

    /// Returns the acceptance timestamp, if accepted.
    #[must_use]
    pub const fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Accepts a pending invitation.
    ///
    /// Returns `true` when the state changed and `false` when the row was
    /// already accepted, in which case nothing is modified.
    pub fn accept(&mut self, clock: &impl Clock) -> bool {
        if self.status.is_accepted() {
            return false;
        }
        self.status = MembershipStatus::Accepted;
        self.responded_at = Some(clock.utc());
        true
    }
}
