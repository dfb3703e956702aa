//! Capability assignment and effective-capability lookup.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use planner_core::AppResult;
use planner_domain::{
    Action, AssignmentChange, Capability, CapabilityId, PrincipalId, ensure_assignable,
    plan_assign, plan_remove, plan_sync,
};

use crate::access_ports::{AccessStore, AccessTransaction, CapabilityStore};
use crate::permission_evaluator::{authorize, load_actor, load_principal};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssignmentMode {
    Assign,
    Remove,
    Sync,
}

impl AssignmentMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Remove => "remove",
            Self::Sync => "sync",
        }
    }
}

/// Application service for capability assignments.
#[derive(Clone)]
pub struct CapabilityService {
    store: Arc<dyn AccessStore>,
}

impl CapabilityService {
    /// Creates a new capability service.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Adds capabilities to a principal. Already-assigned ids are ignored.
    ///
    /// Nothing is written when any id is unknown or inactive.
    pub async fn assign_capabilities(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        capability_ids: &[CapabilityId],
    ) -> AppResult<BTreeSet<CapabilityId>> {
        self.apply(actor_id, target_id, capability_ids, AssignmentMode::Assign)
            .await
    }

    /// Removes capabilities from a principal. Unassigned ids are ignored.
    pub async fn remove_capabilities(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        capability_ids: &[CapabilityId],
    ) -> AppResult<BTreeSet<CapabilityId>> {
        self.apply(actor_id, target_id, capability_ids, AssignmentMode::Remove)
            .await
    }

    /// Replaces the principal's explicit assignments with exactly `capability_ids`.
    pub async fn sync_capabilities(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        capability_ids: &[CapabilityId],
    ) -> AppResult<BTreeSet<CapabilityId>> {
        self.apply(actor_id, target_id, capability_ids, AssignmentMode::Sync)
            .await
    }

    /// Returns the active capabilities a principal may use.
    ///
    /// Superusers implicitly hold every active capability.
    pub async fn effective_capabilities(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Capability>> {
        let mut transaction = self.store.begin().await?;
        let principal = load_principal(&mut *transaction, principal_id).await?;

        if principal.is_superuser() {
            return transaction.list_active_capabilities().await;
        }

        let assigned = transaction.assigned_capability_ids(principal.id).await?;
        let capabilities = transaction.find_capabilities(&assigned).await?;
        Ok(capabilities
            .into_iter()
            .filter(|capability| capability.is_active)
            .collect())
    }

    /// Returns whether a principal may use one capability.
    pub async fn has_capability_access(
        &self,
        principal_id: PrincipalId,
        capability_id: CapabilityId,
    ) -> AppResult<bool> {
        Ok(self
            .effective_capabilities(principal_id)
            .await?
            .iter()
            .any(|capability| capability.id == capability_id))
    }

    async fn apply(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        capability_ids: &[CapabilityId],
        mode: AssignmentMode,
    ) -> AppResult<BTreeSet<CapabilityId>> {
        let requested: BTreeSet<CapabilityId> = capability_ids.iter().copied().collect();

        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let target = load_principal(&mut *transaction, target_id).await?;
        authorize(
            &mut *transaction,
            &actor,
            &Action::AssignCapabilities { target: &target },
        )
        .await?;

        if mode != AssignmentMode::Remove {
            let known = transaction.find_capabilities(&requested).await?;
            ensure_assignable(&requested, &known)?;
        }

        let current = transaction.assigned_capability_ids(target.id).await?;
        let change = match mode {
            AssignmentMode::Assign => plan_assign(&current, &requested),
            AssignmentMode::Remove => plan_remove(&current, &requested),
            AssignmentMode::Sync => plan_sync(&current, &requested),
        };

        write_change(transaction.as_mut(), target.id, &change).await?;
        transaction.commit().await?;

        info!(
            actor_id = %actor.id,
            principal_id = %target.id,
            mode = mode.as_str(),
            added = change.to_add.len(),
            removed = change.to_remove.len(),
            "capability assignments changed"
        );

        Ok(current
            .difference(&change.to_remove)
            .chain(change.to_add.iter())
            .copied()
            .collect())
    }
}

async fn write_change(
    transaction: &mut dyn AccessTransaction,
    principal_id: PrincipalId,
    change: &AssignmentChange,
) -> AppResult<()> {
    if !change.to_remove.is_empty() {
        transaction
            .delete_capability_assignments(principal_id, &change.to_remove)
            .await?;
    }
    if !change.to_add.is_empty() {
        transaction
            .insert_capability_assignments(principal_id, &change.to_add)
            .await?;
    }
    Ok(())
}
