use std::collections::BTreeSet;

use async_trait::async_trait;

use planner_core::AppResult;
use planner_domain::{Capability, CapabilityId, PrincipalId};

/// Capability catalog and explicit assignments.
#[async_trait]
pub trait CapabilityStore: Send {
    /// Returns the capabilities matching the given ids. Unknown ids are skipped.
    async fn find_capabilities(
        &mut self,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<Vec<Capability>>;

    /// Lists every active capability ordered by name.
    async fn list_active_capabilities(&mut self) -> AppResult<Vec<Capability>>;

    /// Returns the explicitly assigned capability ids of a principal.
    async fn assigned_capability_ids(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<CapabilityId>>;

    /// Adds assignment rows; existing rows are left alone.
    async fn insert_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()>;

    /// Deletes assignment rows; missing rows are ignored.
    async fn delete_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()>;
}
