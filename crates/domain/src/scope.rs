//! Resolved scope sets and the manageable-scope projection built from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{PropertyGroupId, PropertyId};

/// The organisational unit a role assignment is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeAnchor {
    /// A single property.
    Property(PropertyId),
    /// A property group.
    Group(PropertyGroupId),
}

/// Organisational units a principal may operate within.
///
/// Always recomputed per request; never stored on the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSet {
    /// Unbounded scope held by superusers.
    All,
    /// Explicit set of units.
    Bounded {
        /// Groups with group-level authority.
        groups: BTreeSet<PropertyGroupId>,
        /// Properties with property-level authority.
        properties: BTreeSet<PropertyId>,
        /// Group shown alongside a single property. Grants nothing.
        context_group: Option<PropertyGroupId>,
    },
}

impl ScopeSet {
    /// Returns a scope with no units.
    #[must_use]
    pub fn empty() -> Self {
        Self::Bounded {
            groups: BTreeSet::new(),
            properties: BTreeSet::new(),
            context_group: None,
        }
    }

    /// Returns the scope of a group administrator.
    #[must_use]
    pub fn for_group(
        group_id: PropertyGroupId,
        properties: impl IntoIterator<Item = PropertyId>,
    ) -> Self {
        Self::Bounded {
            groups: BTreeSet::from([group_id]),
            properties: properties.into_iter().collect(),
            context_group: None,
        }
    }

    /// Returns the scope of a property-anchored principal.
    #[must_use]
    pub fn for_property(property_id: PropertyId, context_group: Option<PropertyGroupId>) -> Self {
        Self::Bounded {
            groups: BTreeSet::new(),
            properties: BTreeSet::from([property_id]),
            context_group,
        }
    }

    /// Returns whether this is the unbounded superuser scope.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns whether the property is inside this scope.
    #[must_use]
    pub fn contains(&self, property_id: PropertyId) -> bool {
        match self {
            Self::All => true,
            Self::Bounded { properties, .. } => properties.contains(&property_id),
        }
    }

    /// Returns whether group-level authority over the group is inside this scope.
    #[must_use]
    pub fn covers_group(&self, group_id: PropertyGroupId) -> bool {
        match self {
            Self::All => true,
            Self::Bounded { groups, .. } => groups.contains(&group_id),
        }
    }

    /// Returns whether the anchor is inside this scope.
    #[must_use]
    pub fn covers(&self, anchor: ScopeAnchor) -> bool {
        match anchor {
            ScopeAnchor::Property(property_id) => self.contains(property_id),
            ScopeAnchor::Group(group_id) => self.covers_group(group_id),
        }
    }

    /// Returns the explicit property ids, `None` for the unbounded scope.
    #[must_use]
    pub fn property_ids(&self) -> Option<&BTreeSet<PropertyId>> {
        match self {
            Self::All => None,
            Self::Bounded { properties, .. } => Some(properties),
        }
    }

    /// Returns the explicit group ids, `None` for the unbounded scope.
    #[must_use]
    pub fn group_ids(&self) -> Option<&BTreeSet<PropertyGroupId>> {
        match self {
            Self::All => None,
            Self::Bounded { groups, .. } => Some(groups),
        }
    }

    /// Returns the display-only group of a property-anchored scope.
    #[must_use]
    pub fn context_group(&self) -> Option<PropertyGroupId> {
        match self {
            Self::All => None,
            Self::Bounded { context_group, .. } => *context_group,
        }
    }
}

/// Group entry in a manageable-scope listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGroupSummary {
    /// Group identifier.
    pub id: PropertyGroupId,
    /// Group name.
    pub name: String,
}

/// Property entry in a manageable-scope listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    /// Property identifier.
    pub id: PropertyId,
    /// Property name.
    pub name: String,
    /// Group the property belongs to, for display.
    pub property_group: Option<PropertyGroupSummary>,
}

/// Properties and groups an actor may assign users into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageableScopes {
    /// Whether the actor holds the unbounded scope.
    pub can_manage_all: bool,
    /// Properties users may be assigned into.
    pub properties: Vec<PropertySummary>,
    /// Groups users may be assigned into.
    pub property_groups: Vec<PropertyGroupSummary>,
}

impl ManageableScopes {
    /// Returns an empty listing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            can_manage_all: false,
            properties: Vec::new(),
            property_groups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ScopeAnchor, ScopeSet};
    use crate::{PropertyGroupId, PropertyId};

    #[test]
    fn context_group_grants_no_group_authority() {
        let scope = ScopeSet::for_property(PropertyId::new(10), Some(PropertyGroupId::new(1)));

        assert!(scope.contains(PropertyId::new(10)));
        assert!(!scope.covers_group(PropertyGroupId::new(1)));
        assert_eq!(scope.context_group(), Some(PropertyGroupId::new(1)));
    }

    #[test]
    fn unbounded_scope_is_not_materialized() {
        let scope = ScopeSet::All;

        assert!(scope.is_unbounded());
        assert!(scope.property_ids().is_none());
        assert!(scope.covers(ScopeAnchor::Group(PropertyGroupId::new(99))));
    }

    #[test]
    fn empty_scope_covers_nothing() {
        let scope = ScopeSet::empty();
        assert!(!scope.contains(PropertyId::new(1)));
        assert!(!scope.covers_group(PropertyGroupId::new(1)));
    }

    proptest! {
        #[test]
        fn group_scope_contains_exactly_its_members(
            members in prop::collection::btree_set(0_i64..50, 0..10),
            probe in 0_i64..50,
        ) {
            let scope = ScopeSet::for_group(
                PropertyGroupId::new(1),
                members.iter().copied().map(PropertyId::new),
            );

            prop_assert_eq!(scope.contains(PropertyId::new(probe)), members.contains(&probe));
        }
    }
}
