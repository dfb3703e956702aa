//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod capability_service;
mod invitation_mailer;
mod invitation_service;
mod permission_evaluator;
mod scope_resolver;
mod user_admin_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    AccessStore, AccessTransaction, CapabilityStore, DirectoryStore, EmailService,
    InvitationNotifier, InvitationTokenStore,
};
pub use capability_service::CapabilityService;
pub use invitation_mailer::InvitationMailer;
pub use invitation_service::{InvitationService, IssuedInvitation};
pub use permission_evaluator::{authorize, evaluate, role_options};
pub use scope_resolver::{manageable_scopes, resolve_scope};
pub use user_admin_service::{
    CreateUserInput, CreatedUser, ManagedUser, UpdateProfileInput, UpdateUserInput,
    UserAdministrationService, UserStats,
};
