//! Per-request scope resolution and the manageable-scope listing built on it.

use std::collections::BTreeMap;

use planner_core::AppResult;
use planner_domain::{
    ManageableScopes, Principal, Property, PropertyGroupId, PropertyGroupSummary,
    PropertySummary, Role, ScopeSet,
};

use crate::access_ports::DirectoryStore;

/// Resolves the organisational units `principal` may operate within.
///
/// Group administrators cover the group's current properties; the list is read
/// fresh on every call so property moves take effect immediately.
pub async fn resolve_scope<D>(directory: &mut D, principal: &Principal) -> AppResult<ScopeSet>
where
    D: DirectoryStore + ?Sized,
{
    let Some(role) = principal.role else {
        return Ok(ScopeSet::empty());
    };

    match role {
        Role::SuperUser => Ok(ScopeSet::All),
        Role::GroupAdmin(group_id) => {
            let properties = directory.list_group_properties(group_id).await?;
            Ok(ScopeSet::for_group(
                group_id,
                properties.into_iter().map(|property| property.id),
            ))
        }
        Role::PropertyAdmin(property_id) | Role::Tenant(property_id) => {
            let context_group = directory
                .find_property(property_id)
                .await?
                .and_then(|property| property.group_id);
            Ok(ScopeSet::for_property(property_id, context_group))
        }
    }
}

/// Lists the properties and groups `actor` may assign users into.
///
/// Principals that cannot assign any role get an empty listing.
pub async fn manageable_scopes<D>(
    directory: &mut D,
    actor: &Principal,
) -> AppResult<ManageableScopes>
where
    D: DirectoryStore + ?Sized,
{
    let can_assign_any = actor
        .role_kind()
        .is_some_and(|kind| !kind.assignable_roles().is_empty());
    if !can_assign_any {
        return Ok(ManageableScopes::none());
    }

    let scope = resolve_scope(directory, actor).await?;
    let group_names: BTreeMap<PropertyGroupId, String> = directory
        .list_property_groups()
        .await?
        .into_iter()
        .map(|group| (group.id, String::from(group.name)))
        .collect();

    let properties = match scope.property_ids() {
        None => directory.list_properties().await?,
        Some(property_ids) => {
            let mut properties = Vec::with_capacity(property_ids.len());
            for property_id in property_ids {
                if let Some(property) = directory.find_property(*property_id).await? {
                    properties.push(property);
                }
            }
            properties
        }
    };

    let property_groups = group_names
        .iter()
        .filter(|(group_id, _)| scope.covers_group(**group_id))
        .map(|(group_id, name)| PropertyGroupSummary {
            id: *group_id,
            name: name.clone(),
        })
        .collect();

    Ok(ManageableScopes {
        can_manage_all: scope.is_unbounded(),
        properties: properties
            .into_iter()
            .map(|property| summarize_property(property, &group_names))
            .collect(),
        property_groups,
    })
}

fn summarize_property(
    property: Property,
    group_names: &BTreeMap<PropertyGroupId, String>,
) -> PropertySummary {
    let property_group = property.group_id.and_then(|group_id| {
        group_names.get(&group_id).map(|name| PropertyGroupSummary {
            id: group_id,
            name: name.clone(),
        })
    });

    PropertySummary {
        id: property.id,
        name: String::from(property.name),
        property_group,
    }
}

#[cfg(test)]
mod tests {
    use planner_domain::{PropertyGroupId, PropertyId, Role, ScopeSet};

    use super::{manageable_scopes, resolve_scope};
    use crate::test_support::FakeAccessStore;

    #[tokio::test]
    async fn group_admin_scope_follows_current_membership() {
        let store = FakeAccessStore::with_portfolio();
        let admin = store.add_active(Some(Role::GroupAdmin(PropertyGroupId::new(1))));

        let mut directory = store.state();
        let scope = resolve_scope(&mut directory, &admin).await;
        assert_eq!(
            scope.ok(),
            Some(ScopeSet::for_group(
                PropertyGroupId::new(1),
                [PropertyId::new(10), PropertyId::new(11)]
            ))
        );

        directory.move_property(PropertyId::new(11), None);
        let scope = resolve_scope(&mut directory, &admin).await;
        assert_eq!(
            scope.ok(),
            Some(ScopeSet::for_group(
                PropertyGroupId::new(1),
                [PropertyId::new(10)]
            ))
        );
    }

    #[tokio::test]
    async fn property_admin_scope_carries_context_group() {
        let store = FakeAccessStore::with_portfolio();
        let admin = store.add_active(Some(Role::PropertyAdmin(PropertyId::new(10))));

        let mut directory = store.state();
        let scope = resolve_scope(&mut directory, &admin).await;
        assert_eq!(
            scope.ok(),
            Some(ScopeSet::for_property(
                PropertyId::new(10),
                Some(PropertyGroupId::new(1))
            ))
        );
    }

    #[tokio::test]
    async fn manageable_scopes_lists_group_properties_with_group_names() {
        let store = FakeAccessStore::with_portfolio();
        let admin = store.add_active(Some(Role::GroupAdmin(PropertyGroupId::new(1))));

        let mut directory = store.state();
        let Ok(scopes) = manageable_scopes(&mut directory, &admin).await else {
            panic!("manageable scopes failed");
        };

        assert!(!scopes.can_manage_all);
        let names: Vec<&str> = scopes.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Harbor View", "Lakeside"]);
        assert_eq!(scopes.property_groups.len(), 1);
        assert_eq!(
            scopes.properties[0]
                .property_group
                .as_ref()
                .map(|group| group.name.as_str()),
            Some("Waterfront")
        );
    }

    #[tokio::test]
    async fn superuser_manages_everything_and_tenant_nothing() {
        let store = FakeAccessStore::with_portfolio();
        let superuser = store.add_active(Some(Role::SuperUser));
        let tenant = store.add_active(Some(Role::Tenant(PropertyId::new(10))));

        let mut directory = store.state();
        let Ok(scopes) = manageable_scopes(&mut directory, &superuser).await else {
            panic!("manageable scopes failed");
        };
        assert!(scopes.can_manage_all);
        assert_eq!(scopes.properties.len(), 3);
        assert_eq!(scopes.property_groups.len(), 2);

        let Ok(scopes) = manageable_scopes(&mut directory, &tenant).await else {
            panic!("manageable scopes failed");
        };
        assert!(scopes.properties.is_empty());
        assert!(scopes.property_groups.is_empty());
    }
}
