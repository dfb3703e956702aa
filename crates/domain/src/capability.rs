//! Application capabilities and assignment planning.

use std::collections::BTreeSet;

use planner_core::Denial;
use serde::{Deserialize, Serialize};

/// Identifier of a capability (application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(i64);

impl CapabilityId {
    /// Creates a capability identifier from its stored value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the stored value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A discrete application principals may be granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability identifier.
    pub id: CapabilityId,
    /// URL-safe identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Only active capabilities may be newly assigned.
    pub is_active: bool,
}

/// Rows to insert and delete to reach a target assignment set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentChange {
    /// Capabilities to add.
    pub to_add: BTreeSet<CapabilityId>,
    /// Capabilities to remove.
    pub to_remove: BTreeSet<CapabilityId>,
}

impl AssignmentChange {
    /// Returns whether nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Ensures every requested id names a known, active capability.
pub fn ensure_assignable(
    requested: &BTreeSet<CapabilityId>,
    known: &[Capability],
) -> Result<(), Denial> {
    let all_active = requested.iter().all(|id| {
        known
            .iter()
            .any(|capability| capability.id == *id && capability.is_active)
    });

    if all_active {
        Ok(())
    } else {
        Err(Denial::InvalidCapability)
    }
}

/// Plans an incremental add; already-assigned ids are ignored.
#[must_use]
pub fn plan_assign(
    current: &BTreeSet<CapabilityId>,
    requested: &BTreeSet<CapabilityId>,
) -> AssignmentChange {
    AssignmentChange {
        to_add: requested.difference(current).copied().collect(),
        to_remove: BTreeSet::new(),
    }
}

/// Plans an incremental removal; unassigned ids are ignored.
#[must_use]
pub fn plan_remove(
    current: &BTreeSet<CapabilityId>,
    requested: &BTreeSet<CapabilityId>,
) -> AssignmentChange {
    AssignmentChange {
        to_add: BTreeSet::new(),
        to_remove: requested.intersection(current).copied().collect(),
    }
}

/// Plans a full replacement of the assignment set.
#[must_use]
pub fn plan_sync(
    current: &BTreeSet<CapabilityId>,
    requested: &BTreeSet<CapabilityId>,
) -> AssignmentChange {
    AssignmentChange {
        to_add: requested.difference(current).copied().collect(),
        to_remove: current.difference(requested).copied().collect(),
    }
}
