use serde::{Deserialize, Serialize};

use planner_domain::{InvitationState, Principal, Role};

use crate::invitation_service::IssuedInvitation;

/// Input payload for creating a principal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserInput {
    /// Login email.
    pub email: String,
    /// Optional given name.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
    /// Role with its scope anchor.
    pub role: Role,
}

/// Partial update of another principal. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateUserInput {
    /// Replacement email.
    pub email: Option<String>,
    /// Replacement given name; blank clears it.
    pub first_name: Option<String>,
    /// Replacement family name; blank clears it.
    pub last_name: Option<String>,
    /// Replacement role.
    pub role: Option<Role>,
}

/// Name fields a principal may change on its own account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateProfileInput {
    /// Replacement given name; blank clears it.
    pub first_name: Option<String>,
    /// Replacement family name; blank clears it.
    pub last_name: Option<String>,
}

/// Result of creating a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedUser {
    /// The new, inactive principal.
    pub principal: Principal,
    /// The invitation issued for it.
    pub invitation: IssuedInvitation,
}

/// A principal the actor may manage, with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedUser {
    /// The managed principal.
    pub principal: Principal,
    /// Current invitation lifecycle state.
    pub invitation_state: InvitationState,
}

/// Counts over the principals visible to an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Every visible principal.
    pub total_users: usize,
    /// Visible principals that may sign in.
    pub active_users: usize,
    /// Principals holding any administrative role, superusers included.
    pub admin_users: usize,
    /// Tenants.
    pub tenants: usize,
}
