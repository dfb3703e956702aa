use std::collections::BTreeSet;

use async_trait::async_trait;

use planner_application::CapabilityStore;
use planner_core::{AppError, AppResult};
use planner_domain::{Capability, CapabilityId, PrincipalId};

use super::InMemoryAccessTransaction;

#[async_trait]
impl CapabilityStore for InMemoryAccessTransaction {
    async fn find_capabilities(
        &mut self,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<Vec<Capability>> {
        Ok(capability_ids
            .iter()
            .filter_map(|capability_id| self.staged.capabilities.get(capability_id).cloned())
            .collect())
    }

    async fn list_active_capabilities(&mut self) -> AppResult<Vec<Capability>> {
        let mut capabilities: Vec<Capability> = self
            .staged
            .capabilities
            .values()
            .filter(|capability| capability.is_active)
            .cloned()
            .collect();
        capabilities.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(capabilities)
    }

    async fn assigned_capability_ids(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<CapabilityId>> {
        Ok(self
            .staged
            .capability_assignments
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
        if !self.staged.principals.contains_key(&principal_id) {
            return Err(AppError::NotFound(format!(
                "principal '{principal_id}' does not exist"
            )));
        }

        for capability_id in capability_ids {
            if !self.staged.capabilities.contains_key(capability_id) {
                return Err(AppError::NotFound(format!(
                    "capability '{capability_id}' does not exist"
                )));
            }
        }

        self.staged.capability_assignments.extend(
            capability_ids
                .iter()
                .map(|capability_id| (principal_id, *capability_id)),
        );
        Ok(())
    }

    async fn delete_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()> {
        self.staged
            .capability_assignments
            .retain(|(owner, capability_id)| {
                *owner != principal_id || !capability_ids.contains(capability_id)
            });
        Ok(())
    }
}
