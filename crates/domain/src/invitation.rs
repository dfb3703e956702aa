//! Invitation tokens and the account-activation state machine.

use chrono::{DateTime, Duration, Utc};
use planner_core::Denial;
use serde::{Deserialize, Serialize};

use crate::{Principal, PrincipalId};

/// Number of days an invitation token stays acceptable.
pub const INVITATION_VALIDITY_DAYS: i64 = 7;

/// Returns the fixed invitation validity window.
#[must_use]
pub fn invitation_validity() -> Duration {
    Duration::days(INVITATION_VALIDITY_DAYS)
}

/// Stored invitation token. Only the SHA-256 hash of the bearer value is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationToken {
    /// Owning principal.
    pub principal_id: PrincipalId,
    /// Hex SHA-256 hash of the raw token value.
    pub token_hash: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Set once the invitation was accepted.
    pub consumed_at: Option<DateTime<Utc>>,
    /// Set when a newer invitation replaced this one.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl InvitationToken {
    /// Creates a fresh, unconsumed token record.
    #[must_use]
    pub fn issue(principal_id: PrincipalId, token_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            principal_id,
            token_hash,
            issued_at: now,
            consumed_at: None,
            revoked_at: None,
        }
    }

    /// Returns the end of the validity window.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + invitation_validity()
    }

    /// Returns whether the token is past its validity window at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at > invitation_validity()
    }

    /// Returns whether the token was accepted.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Returns whether the token was neither consumed nor revoked.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.consumed_at.is_none() && self.revoked_at.is_none()
    }

    /// Checks whether the token may be accepted at `now`.
    ///
    /// Revoked tokens read as unknown. Expiry is reported before consumption,
    /// so a token replayed after its window yields `TOKEN_EXPIRED`.
    pub fn check_acceptable(&self, now: DateTime<Utc>) -> Result<(), Denial> {
        if self.revoked_at.is_some() {
            return Err(Denial::TokenNotFound);
        }

        if self.is_expired_at(now) {
            return Err(Denial::TokenExpired);
        }

        if self.is_consumed() {
            return Err(Denial::TokenAlreadyConsumed);
        }

        Ok(())
    }
}

/// Activation state of a principal as seen by the invitation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationState {
    /// Inactive, no invitation issued yet.
    CreatedInactive,
    /// Pending invitation inside its validity window.
    Invited,
    /// Pending invitation past its validity window.
    Expired,
    /// Invitation accepted and account active.
    Accepted,
    /// Accepted, later deactivated.
    Deactivated,
    /// Accepted, deactivated, then re-activated by an administrator.
    ManuallyActivated,
}

impl InvitationState {
    /// Returns a stable storage value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedInactive => "CREATED_INACTIVE",
            Self::Invited => "INVITED",
            Self::Expired => "EXPIRED",
            Self::Accepted => "ACCEPTED",
            Self::Deactivated => "DEACTIVATED",
            Self::ManuallyActivated => "MANUALLY_ACTIVATED",
        }
    }
}

/// Derives the lifecycle state from a principal and its latest token.
#[must_use]
pub fn invitation_state(
    principal: &Principal,
    latest_token: Option<&InvitationToken>,
    now: DateTime<Utc>,
) -> InvitationState {
    let accepted_at = latest_token.and_then(|token| token.consumed_at);

    match (principal.is_active, accepted_at) {
        (true, Some(accepted_at)) => match principal.activated_at {
            Some(activated_at) if activated_at > accepted_at => InvitationState::ManuallyActivated,
            _ => InvitationState::Accepted,
        },
        (true, None) => InvitationState::Accepted,
        (false, Some(_)) => InvitationState::Deactivated,
        (false, None) => match latest_token.filter(|token| token.is_pending()) {
            Some(token) if token.is_expired_at(now) => InvitationState::Expired,
            Some(_) => InvitationState::Invited,
            None => InvitationState::CreatedInactive,
        },
    }
}

/// Kind of invitation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// First invitation for a new principal.
    Invited,
    /// Re-issued invitation.
    Resent,
}

impl NoticeKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Resent => "resent",
        }
    }
}

/// Role description carried into invitation emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRoleInfo {
    /// Display label of the role, `"User"` when none is assigned.
    pub role_label: String,
    /// Name of the anchoring property.
    pub property_name: Option<String>,
    /// Name of the anchoring group, or of the property's group.
    pub property_group_name: Option<String>,
}

impl InvitationRoleInfo {
    /// Describes a principal without a role.
    #[must_use]
    pub fn unassigned() -> Self {
        Self {
            role_label: "User".to_owned(),
            property_name: None,
            property_group_name: None,
        }
    }
}

/// Side-effect event handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationNotice {
    /// Event kind.
    pub kind: NoticeKind,
    /// Invited principal.
    pub principal_id: PrincipalId,
    /// Recipient address.
    pub email: String,
    /// Raw bearer token.
    pub token: String,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
    /// Role the invitee will hold.
    pub role: InvitationRoleInfo,
}
