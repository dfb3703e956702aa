//! Shared in-process fakes for service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use planner_core::{AppError, AppResult, NonEmptyString};
use planner_domain::{
    Capability, CapabilityId, EmailAddress, InvitationNotice, InvitationToken, Principal,
    PrincipalId, Property, PropertyGroup, PropertyGroupId, PropertyId, Role,
};

use crate::access_ports::{
    AccessStore, AccessTransaction, CapabilityStore, DirectoryStore, InvitationNotifier,
    InvitationTokenStore,
};

#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) principals: BTreeMap<PrincipalId, Principal>,
    pub(crate) groups: BTreeMap<PropertyGroupId, PropertyGroup>,
    pub(crate) properties: BTreeMap<PropertyId, Property>,
    pub(crate) tokens: Vec<InvitationToken>,
    pub(crate) capabilities: BTreeMap<CapabilityId, Capability>,
    pub(crate) assignments: BTreeSet<(PrincipalId, CapabilityId)>,
    pub(crate) commits: usize,
}

/// Store whose transactions write straight through to shared state.
#[derive(Clone, Default)]
pub(crate) struct FakeAccessStore {
    state: Arc<Mutex<FakeState>>,
}

fn name(value: &str) -> NonEmptyString {
    match NonEmptyString::new(value) {
        Ok(name) => name,
        Err(error) => panic!("fixture name rejected: {error}"),
    }
}

impl FakeAccessStore {
    /// Two groups, three properties and three capabilities, one inactive.
    pub(crate) fn with_portfolio() -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            for (id, group_name) in [(1, "Waterfront"), (2, "Uptown")] {
                let id = PropertyGroupId::new(id);
                state.groups.insert(
                    id,
                    PropertyGroup {
                        id,
                        name: name(group_name),
                    },
                );
            }
            for (id, property_name, group) in [
                (10, "Harbor View", 1),
                (11, "Lakeside", 1),
                (20, "Midtown Lofts", 2),
            ] {
                let id = PropertyId::new(id);
                state.properties.insert(
                    id,
                    Property {
                        id,
                        name: name(property_name),
                        group_id: Some(PropertyGroupId::new(group)),
                    },
                );
            }
            for (id, slug, is_active) in [
                (1, "planner", true),
                (2, "reports", true),
                (3, "legacy", false),
            ] {
                let id = CapabilityId::new(id);
                state.capabilities.insert(
                    id,
                    Capability {
                        id,
                        slug: slug.to_owned(),
                        name: slug.to_uppercase(),
                        is_active,
                    },
                );
            }
        }
        store
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a transaction handle for calling store functions directly.
    pub(crate) fn state(&self) -> FakeTransaction {
        FakeTransaction {
            state: Arc::clone(&self.state),
        }
    }

    pub(crate) fn add_principal(&self, role: Option<Role>, is_active: bool) -> Principal {
        let address = format!("user{}@example.com", self.lock().principals.len());
        let email = match EmailAddress::new(address) {
            Ok(email) => email,
            Err(error) => panic!("fixture email rejected: {error}"),
        };
        let mut principal = Principal::new_inactive(email, None, None, role, Utc::now());
        if is_active {
            principal.activate(Utc::now());
        }
        self.lock()
            .principals
            .insert(principal.id, principal.clone());
        principal
    }

    pub(crate) fn add_active(&self, role: Option<Role>) -> Principal {
        self.add_principal(role, true)
    }

    pub(crate) fn principal(&self, principal_id: PrincipalId) -> Option<Principal> {
        self.lock().principals.get(&principal_id).cloned()
    }

    pub(crate) fn tokens_of(&self, principal_id: PrincipalId) -> Vec<InvitationToken> {
        self.lock()
            .tokens
            .iter()
            .filter(|token| token.principal_id == principal_id)
            .cloned()
            .collect()
    }

    pub(crate) fn assigned(&self, principal_id: PrincipalId) -> BTreeSet<CapabilityId> {
        self.lock()
            .assignments
            .iter()
            .filter(|(owner, _)| *owner == principal_id)
            .map(|(_, capability_id)| *capability_id)
            .collect()
    }

    pub(crate) fn commits(&self) -> usize {
        self.lock().commits
    }
}

#[async_trait]
impl AccessStore for FakeAccessStore {
    async fn begin(&self) -> AppResult<Box<dyn AccessTransaction>> {
        Ok(Box::new(self.state()))
    }
}

pub(crate) struct FakeTransaction {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransaction {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn move_property(
        &mut self,
        property_id: PropertyId,
        group_id: Option<PropertyGroupId>,
    ) {
        if let Some(property) = self.lock().properties.get_mut(&property_id) {
            property.group_id = group_id;
        }
    }
}

#[async_trait]
impl DirectoryStore for FakeTransaction {
    async fn find_principal(&mut self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.lock().principals.get(&principal_id).cloned())
    }

    async fn find_principal_by_email(
        &mut self,
        email: &EmailAddress,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .lock()
            .principals
            .values()
            .find(|principal| principal.email == *email)
            .cloned())
    }

    async fn list_principals(&mut self) -> AppResult<Vec<Principal>> {
        let mut principals: Vec<Principal> = self.lock().principals.values().cloned().collect();
        principals.sort_by(|left, right| left.email.as_str().cmp(right.email.as_str()));
        Ok(principals)
    }

    async fn insert_principal(&mut self, principal: &Principal) -> AppResult<()> {
        let mut state = self.lock();
        if state
            .principals
            .values()
            .any(|existing| existing.email == principal.email)
        {
            return Err(AppError::Conflict(format!(
                "email '{}' is already in use",
                principal.email.as_str()
            )));
        }
        state.principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn update_principal(&mut self, principal: &Principal) -> AppResult<()> {
        self.lock().principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn delete_principal(&mut self, principal_id: PrincipalId) -> AppResult<()> {
        let mut state = self.lock();
        state.principals.remove(&principal_id);
        state.tokens.retain(|token| token.principal_id != principal_id);
        state.assignments.retain(|(owner, _)| *owner != principal_id);
        Ok(())
    }

    async fn find_property(&mut self, property_id: PropertyId) -> AppResult<Option<Property>> {
        Ok(self.lock().properties.get(&property_id).cloned())
    }

    async fn find_property_group(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Option<PropertyGroup>> {
        Ok(self.lock().groups.get(&group_id).cloned())
    }

    async fn list_properties(&mut self) -> AppResult<Vec<Property>> {
        let mut properties: Vec<Property> = self.lock().properties.values().cloned().collect();
        properties.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(properties)
    }

    async fn list_group_properties(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Vec<Property>> {
        let properties = self.list_properties().await?;
        Ok(properties
            .into_iter()
            .filter(|property| property.group_id == Some(group_id))
            .collect())
    }

    async fn list_property_groups(&mut self) -> AppResult<Vec<PropertyGroup>> {
        let mut groups: Vec<PropertyGroup> = self.lock().groups.values().cloned().collect();
        groups.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(groups)
    }
}

#[async_trait]
impl InvitationTokenStore for FakeTransaction {
    async fn insert_invitation_token(&mut self, token: &InvitationToken) -> AppResult<()> {
        self.lock().tokens.push(token.clone());
        Ok(())
    }

    async fn revoke_pending_invitation_tokens(
        &mut self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut revoked = 0;
        for token in self
            .lock()
            .tokens
            .iter_mut()
            .filter(|token| token.principal_id == principal_id && token.is_pending())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn find_invitation_token(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<InvitationToken>> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .find(|token| token.token_hash == token_hash)
            .cloned())
    }

    async fn mark_invitation_token_consumed(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.lock();
        let Some(token) = state
            .tokens
            .iter_mut()
            .find(|token| token.token_hash == token_hash && token.is_pending())
        else {
            return Ok(false);
        };
        token.consumed_at = Some(now);
        Ok(true)
    }

    async fn latest_invitation_token(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<InvitationToken>> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .filter(|token| token.principal_id == principal_id)
            .max_by_key(|token| token.issued_at)
            .cloned())
    }

    async fn has_accepted_invitation(&mut self, principal_id: PrincipalId) -> AppResult<bool> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .any(|token| token.principal_id == principal_id && token.is_consumed()))
    }
}

#[async_trait]
impl CapabilityStore for FakeTransaction {
    async fn find_capabilities(
        &mut self,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<Vec<Capability>> {
        let state = self.lock();
        Ok(capability_ids
            .iter()
            .filter_map(|id| state.capabilities.get(id).cloned())
            .collect())
    }

    async fn list_active_capabilities(&mut self) -> AppResult<Vec<Capability>> {
        Ok(self
            .lock()
            .capabilities
            .values()
            .filter(|capability| capability.is_active)
            .cloned()
            .collect())
    }

    async fn assigned_capability_ids(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<CapabilityId>> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|(owner, _)| *owner == principal_id)
            .map(|(_, capability_id)| *capability_id)
            .collect())
    }

    async fn insert_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        for capability_id in capability_ids {
            state.assignments.insert((principal_id, *capability_id));
        }
        Ok(())
    }

    async fn delete_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        for capability_id in capability_ids {
            state.assignments.remove(&(principal_id, *capability_id));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessTransaction for FakeTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.lock().commits += 1;
        Ok(())
    }
}

/// Notifier recording every notice; optionally failing every enqueue.
#[derive(Default)]
pub(crate) struct FakeNotifier {
    pub(crate) notices: Mutex<Vec<InvitationNotice>>,
    pub(crate) fail: bool,
}

impl FakeNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn sent(&self) -> Vec<InvitationNotice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl InvitationNotifier for FakeNotifier {
    async fn enqueue(&self, notice: InvitationNotice) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("notification queue unavailable".to_owned()));
        }
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
        Ok(())
    }
}
