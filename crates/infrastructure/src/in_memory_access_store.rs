//! In-memory access store for tests and local wiring.
//!
//! A transaction holds the store lock for its whole lifetime and writes to a
//! staged copy; commit publishes the copy. Transactions are therefore serialized.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use planner_application::{AccessStore, AccessTransaction};
use planner_core::{AppError, AppResult};
use planner_domain::{
    Capability, CapabilityId, InvitationToken, Principal, PrincipalId, Property, PropertyGroup,
    PropertyGroupId, PropertyId,
};

mod capabilities;
mod directory;
mod invitations;


#[derive(Debug, Clone, Default)]
struct AccessState {
    principals: HashMap<PrincipalId, Principal>,
    property_groups: HashMap<PropertyGroupId, PropertyGroup>,
    properties: HashMap<PropertyId, Property>,
    invitation_tokens: Vec<InvitationToken>,
    capabilities: HashMap<CapabilityId, Capability>,
    capability_assignments: HashSet<(PrincipalId, CapabilityId)>,
}

/// In-memory implementation of the access store port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessStore {
    state: Arc<Mutex<AccessState>>,
}

impl InMemoryAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property group.
    pub async fn save_property_group(&self, group: PropertyGroup) {
        self.state
            .lock()
            .await
            .property_groups
            .insert(group.id, group);
    }

    /// Adds or replaces a property. Its group, when set, must exist.
    pub async fn save_property(&self, property: Property) -> AppResult<()> {
        let mut state = self.state.lock().await;

        if let Some(group_id) = property.group_id
            && !state.property_groups.contains_key(&group_id)
        {
            return Err(AppError::NotFound(format!(
                "property group '{group_id}' does not exist"
            )));
        }

        state.properties.insert(property.id, property);
        Ok(())
    }

    /// Adds or replaces a capability.
    pub async fn save_capability(&self, capability: Capability) {
        self.state
            .lock()
            .await
            .capabilities
            .insert(capability.id, capability);
    }

    /// Stores a principal outside any guarded flow, e.g. the first superuser.
    pub async fn seed_principal(&self, principal: Principal) -> AppResult<()> {
        let mut state = self.state.lock().await;

        if state
            .principals
            .values()
            .any(|existing| existing.email == principal.email && existing.id != principal.id)
        {
            return Err(AppError::Conflict(format!(
                "email '{}' is already in use",
                principal.email.as_str()
            )));
        }

        state.principals.insert(principal.id, principal);
        Ok(())
    }
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn begin(&self) -> AppResult<Box<dyn AccessTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryAccessTransaction { guard, staged }))
    }
}

/// Serialized unit of work over [`InMemoryAccessStore`].
pub struct InMemoryAccessTransaction {
    guard: OwnedMutexGuard<AccessState>,
    staged: AccessState,
}

#[async_trait]
impl AccessTransaction for InMemoryAccessTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
