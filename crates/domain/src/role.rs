//! Role hierarchy and role assignments.
//!
//! The role table below is the only place role ranks and assignability are defined.
//! Everything else asks [`can_assign`].

use std::str::FromStr;

use planner_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{PropertyGroupId, PropertyId, ScopeAnchor};

/// Role discriminator without its scope anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Unbounded authority over every account.
    SuperUser,
    /// Administers one property group and its properties.
    GroupAdmin,
    /// Administers one property.
    PropertyAdmin,
    /// Regular member of one property.
    Tenant,
}

struct RoleDefinition {
    kind: RoleKind,
    rank: u8,
    label: &'static str,
    assignable: &'static [RoleKind],
}

static ROLE_TABLE: [RoleDefinition; 4] = [
    RoleDefinition {
        kind: RoleKind::SuperUser,
        rank: 0,
        label: "Super User",
        assignable: &[
            RoleKind::GroupAdmin,
            RoleKind::PropertyAdmin,
            RoleKind::Tenant,
        ],
    },
    RoleDefinition {
        kind: RoleKind::GroupAdmin,
        rank: 1,
        label: "Property Group Admin",
        assignable: &[RoleKind::PropertyAdmin, RoleKind::Tenant],
    },
    RoleDefinition {
        kind: RoleKind::PropertyAdmin,
        rank: 2,
        label: "Property Admin",
        assignable: &[RoleKind::Tenant],
    },
    RoleDefinition {
        kind: RoleKind::Tenant,
        rank: 3,
        label: "Tenant",
        assignable: &[],
    },
];

impl RoleKind {
    fn definition(self) -> &'static RoleDefinition {
        let index = match self {
            Self::SuperUser => 0,
            Self::GroupAdmin => 1,
            Self::PropertyAdmin => 2,
            Self::Tenant => 3,
        };

        &ROLE_TABLE[index]
    }

    /// Returns the rank of this role; lower is more authoritative.
    #[must_use]
    pub fn rank(self) -> u8 {
        self.definition().rank
    }

    /// Returns the display label for this role.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.definition().label
    }

    /// Returns the roles this role may assign to other principals.
    #[must_use]
    pub fn assignable_roles(self) -> &'static [RoleKind] {
        self.definition().assignable
    }

    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperUser => "super_user",
            Self::GroupAdmin => "group_admin",
            Self::PropertyAdmin => "property_admin",
            Self::Tenant => "tenant",
        }
    }

    /// Returns every role ordered from most to least authoritative.
    #[must_use]
    pub fn all() -> [RoleKind; 4] {
        std::array::from_fn(|index| ROLE_TABLE[index].kind)
    }
}

impl FromStr for RoleKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_user" => Ok(Self::SuperUser),
            "group_admin" => Ok(Self::GroupAdmin),
            "property_admin" => Ok(Self::PropertyAdmin),
            "tenant" => Ok(Self::Tenant),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Returns whether `acting` may assign (and therefore manage) `target`.
#[must_use]
pub fn can_assign(acting: RoleKind, target: RoleKind) -> bool {
    acting.assignable_roles().contains(&target)
}

/// A role together with its scope anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "anchor", rename_all = "snake_case")]
pub enum Role {
    /// Superusers carry no anchor.
    SuperUser,
    /// Anchored to a property group.
    GroupAdmin(PropertyGroupId),
    /// Anchored to a property.
    PropertyAdmin(PropertyId),
    /// Anchored to a property.
    Tenant(PropertyId),
}

impl Role {
    /// Returns the role discriminator.
    #[must_use]
    pub fn kind(&self) -> RoleKind {
        match self {
            Self::SuperUser => RoleKind::SuperUser,
            Self::GroupAdmin(_) => RoleKind::GroupAdmin,
            Self::PropertyAdmin(_) => RoleKind::PropertyAdmin,
            Self::Tenant(_) => RoleKind::Tenant,
        }
    }

    /// Returns the scope anchor, absent for superusers.
    #[must_use]
    pub fn anchor(&self) -> Option<ScopeAnchor> {
        match self {
            Self::SuperUser => None,
            Self::GroupAdmin(group_id) => Some(ScopeAnchor::Group(*group_id)),
            Self::PropertyAdmin(property_id) | Self::Tenant(property_id) => {
                Some(ScopeAnchor::Property(*property_id))
            }
        }
    }

    /// Rebuilds a role from its stored columns, enforcing the anchor invariant.
    pub fn from_parts(
        kind: RoleKind,
        property_id: Option<PropertyId>,
        group_id: Option<PropertyGroupId>,
    ) -> AppResult<Self> {
        match (kind, property_id, group_id) {
            (RoleKind::SuperUser, None, None) => Ok(Self::SuperUser),
            (RoleKind::GroupAdmin, None, Some(group_id)) => Ok(Self::GroupAdmin(group_id)),
            (RoleKind::PropertyAdmin, Some(property_id), None) => {
                Ok(Self::PropertyAdmin(property_id))
            }
            (RoleKind::Tenant, Some(property_id), None) => Ok(Self::Tenant(property_id)),
            _ => Err(AppError::Validation(format!(
                "role '{kind}' has an invalid scope anchor"
            ))),
        }
    }

    /// Returns the anchored property, if any.
    #[must_use]
    pub fn property_id(&self) -> Option<PropertyId> {
        match self.anchor() {
            Some(ScopeAnchor::Property(property_id)) => Some(property_id),
            _ => None,
        }
    }

    /// Returns the anchored property group, if any.
    #[must_use]
    pub fn group_id(&self) -> Option<PropertyGroupId> {
        match self.anchor() {
            Some(ScopeAnchor::Group(group_id)) => Some(group_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Role, RoleKind, can_assign};
    use crate::{PropertyGroupId, PropertyId};

    fn any_role_kind() -> impl Strategy<Value = RoleKind> {
        prop::sample::select(RoleKind::all().to_vec())
    }

    #[test]
    fn assignable_sets_follow_the_hierarchy() {
        assert_eq!(
            RoleKind::SuperUser.assignable_roles(),
            &[
                RoleKind::GroupAdmin,
                RoleKind::PropertyAdmin,
                RoleKind::Tenant
            ]
        );
        assert_eq!(
            RoleKind::GroupAdmin.assignable_roles(),
            &[RoleKind::PropertyAdmin, RoleKind::Tenant]
        );
        assert_eq!(
            RoleKind::PropertyAdmin.assignable_roles(),
            &[RoleKind::Tenant]
        );
        assert!(RoleKind::Tenant.assignable_roles().is_empty());
    }

    #[test]
    fn ranks_descend_from_super_user() {
        let ranks: Vec<u8> = RoleKind::all().iter().map(|kind| kind.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn from_parts_rejects_mismatched_anchor() {
        let result = Role::from_parts(RoleKind::GroupAdmin, Some(PropertyId::new(10)), None);
        assert!(result.is_err());

        let result = Role::from_parts(RoleKind::SuperUser, None, Some(PropertyGroupId::new(1)));
        assert!(result.is_err());
    }

    #[test]
    fn from_parts_restores_tagged_role() {
        let role = Role::from_parts(RoleKind::Tenant, Some(PropertyId::new(10)), None);
        assert_eq!(role.ok(), Some(Role::Tenant(PropertyId::new(10))));
    }

    #[test]
    fn role_serializes_with_tagged_anchor() {
        let encoded = serde_json::to_value(Role::GroupAdmin(PropertyGroupId::new(4)));
        assert_eq!(
            encoded.ok(),
            Some(serde_json::json!({"role": "group_admin", "anchor": 4}))
        );

        let encoded = serde_json::to_value(Role::SuperUser);
        assert_eq!(encoded.ok(), Some(serde_json::json!({"role": "super_user"})));
    }

    proptest! {
        #[test]
        fn no_role_assigns_its_own_rank(kind in any_role_kind()) {
            prop_assert!(!can_assign(kind, kind));
        }

        #[test]
        fn assignment_only_flows_down_the_hierarchy(
            acting in any_role_kind(),
            target in any_role_kind(),
        ) {
            if can_assign(acting, target) {
                prop_assert!(acting.rank() < target.rank());
            }
        }

        #[test]
        fn storage_value_roundtrips(kind in any_role_kind()) {
            prop_assert_eq!(kind.as_str().parse::<RoleKind>().ok(), Some(kind));
        }
    }
}
