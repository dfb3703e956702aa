//! User administration: guarded lifecycle operations and listings.

use std::sync::Arc;

use planner_core::{AppError, AppResult};
use planner_domain::{Role, ScopeAnchor};

use crate::access_ports::{AccessStore, DirectoryStore, InvitationNotifier};
use crate::invitation_service::InvitationService;

mod inputs;
mod lifecycle;
mod listing;
mod profile;


pub use inputs::{
    CreateUserInput, CreatedUser, ManagedUser, UpdateProfileInput, UpdateUserInput, UserStats,
};

/// Application service for administering principals.
#[derive(Clone)]
pub struct UserAdministrationService {
    store: Arc<dyn AccessStore>,
    invitations: InvitationService,
}

impl UserAdministrationService {
    /// Creates a new user administration service.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, notifier: Arc<dyn InvitationNotifier>) -> Self {
        Self {
            invitations: InvitationService::new(store.clone(), notifier),
            store,
        }
    }

    /// Returns the invitation service sharing this service's store and notifier.
    #[must_use]
    pub fn invitations(&self) -> &InvitationService {
        &self.invitations
    }
}

/// Ensures the role's anchor names an existing property or group.
async fn ensure_anchor_exists<D>(directory: &mut D, role: Role) -> AppResult<()>
where
    D: DirectoryStore + ?Sized,
{
    match role.anchor() {
        None => Ok(()),
        Some(ScopeAnchor::Property(property_id)) => {
            if directory.find_property(property_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "property '{property_id}' does not exist"
                )));
            }
            Ok(())
        }
        Some(ScopeAnchor::Group(group_id)) => {
            if directory.find_property_group(group_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "property group '{group_id}' does not exist"
                )));
            }
            Ok(())
        }
    }
}

/// Trims a name field; blank values clear it.
fn normalize_name(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
