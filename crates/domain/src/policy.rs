//! Pure access decision over an already-resolved actor scope.

use planner_core::{AppResult, Denial};
use serde::{Deserialize, Serialize};

use crate::{Principal, Role, ScopeSet, can_assign};

/// A guarded operation together with its target.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Create a principal holding `role`.
    Create {
        /// Proposed role assignment.
        role: Role,
    },
    /// Update a principal, optionally changing its role.
    Update {
        /// Existing principal.
        target: &'a Principal,
        /// Proposed replacement role.
        new_role: Option<Role>,
    },
    /// Delete a principal.
    Delete {
        /// Existing principal.
        target: &'a Principal,
    },
    /// Manually re-activate a principal.
    Activate {
        /// Existing principal.
        target: &'a Principal,
    },
    /// Deactivate a principal.
    Deactivate {
        /// Existing principal.
        target: &'a Principal,
    },
    /// Assign, remove, or sync capabilities of a principal.
    AssignCapabilities {
        /// Existing principal.
        target: &'a Principal,
    },
    /// Issue a fresh invitation for a principal.
    ResendInvitation {
        /// Existing principal.
        target: &'a Principal,
    },
}

impl<'a> Action<'a> {
    /// Returns the existing principal acted upon, if any.
    #[must_use]
    pub fn target(&self) -> Option<&'a Principal> {
        match self {
            Self::Create { .. } => None,
            Self::Update { target, .. }
            | Self::Delete { target }
            | Self::Activate { target }
            | Self::Deactivate { target }
            | Self::AssignCapabilities { target }
            | Self::ResendInvitation { target } => Some(target),
        }
    }

    /// Returns the role the action would assign, if any.
    #[must_use]
    pub fn proposed_role(&self) -> Option<Role> {
        match self {
            Self::Create { role } => Some(*role),
            Self::Update { new_role, .. } => *new_role,
            _ => None,
        }
    }

    /// Returns a stable name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Activate { .. } => "activate",
            Self::Deactivate { .. } => "deactivate",
            Self::AssignCapabilities { .. } => "assign_capabilities",
            Self::ResendInvitation { .. } => "resend_invitation",
        }
    }
}

/// What an allowed action permits the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    /// Perform the action as requested.
    Proceed,
    /// Clear the active flag instead of deleting.
    SoftDelete,
    /// Remove the record permanently.
    HardDelete,
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Action is allowed.
    Allow(Grant),
    /// Action is denied for the given reason.
    Deny(Denial),
}

impl Decision {
    /// Returns whether the action is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Converts the decision into a result.
    pub fn into_result(self) -> AppResult<Grant> {
        match self {
            Self::Allow(grant) => Ok(grant),
            Self::Deny(denial) => Err(denial.into()),
        }
    }
}

/// Decides whether `actor`, holding `actor_scope`, may perform `action`.
#[must_use]
pub fn decide(actor: &Principal, actor_scope: &ScopeSet, action: &Action<'_>) -> Decision {
    let target = action.target();

    if target.is_some_and(|target| target.id == actor.id) {
        return Decision::Deny(Denial::SelfModificationForbidden);
    }

    let Some(actor_role) = actor.role else {
        return Decision::Deny(Denial::RoleNotAssignable);
    };

    if actor_role == Role::SuperUser {
        return Decision::Allow(match action {
            Action::Delete { .. } => Grant::HardDelete,
            _ => Grant::Proceed,
        });
    }

    let acting = actor_role.kind();

    let current_role = match target {
        Some(target) => match target.role {
            Some(role) => Some(role),
            None => return Decision::Deny(Denial::OutOfScope),
        },
        None => None,
    };
    let proposed_role = action.proposed_role();

    let roles = current_role.into_iter().chain(proposed_role);
    for role in roles.clone() {
        if !can_assign(acting, role.kind()) {
            return Decision::Deny(Denial::RoleNotAssignable);
        }
    }

    for role in roles {
        if !role
            .anchor()
            .is_some_and(|anchor| actor_scope.covers(anchor))
        {
            return Decision::Deny(Denial::OutOfScope);
        }
    }

    Decision::Allow(match action {
        Action::Delete { .. } => Grant::SoftDelete,
        _ => Grant::Proceed,
    })
}
