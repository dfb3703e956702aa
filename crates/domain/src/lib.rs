//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod capability;
mod invitation;
mod organization;
mod policy;
mod principal;
mod role;
mod scope;

pub use capability::{
    AssignmentChange, Capability, CapabilityId, ensure_assignable, plan_assign, plan_remove,
    plan_sync,
};
pub use invitation::{
    INVITATION_VALIDITY_DAYS, InvitationNotice, InvitationRoleInfo, InvitationState,
    InvitationToken, NoticeKind, invitation_state, invitation_validity,
};
pub use organization::{Property, PropertyGroup, PropertyGroupId, PropertyId};
pub use policy::{Action, Decision, Grant, decide};
pub use principal::{EmailAddress, Principal, PrincipalId};
pub use role::{Role, RoleKind, can_assign};
pub use scope::{
    ManageableScopes, PropertyGroupSummary, PropertySummary, ScopeAnchor, ScopeSet,
};
