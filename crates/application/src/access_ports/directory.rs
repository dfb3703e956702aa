use async_trait::async_trait;

use planner_core::AppResult;
use planner_domain::{
    EmailAddress, Principal, PrincipalId, Property, PropertyGroup, PropertyGroupId, PropertyId,
};

/// Principals and the organisational tree, read and written inside a transaction.
#[async_trait]
pub trait DirectoryStore: Send {
    /// Finds a principal by id.
    async fn find_principal(&mut self, principal_id: PrincipalId) -> AppResult<Option<Principal>>;

    /// Finds a principal by canonical email address.
    async fn find_principal_by_email(
        &mut self,
        email: &EmailAddress,
    ) -> AppResult<Option<Principal>>;

    /// Lists every principal ordered by email.
    async fn list_principals(&mut self) -> AppResult<Vec<Principal>>;

    /// Inserts a new principal. Fails with a conflict when the email is taken.
    async fn insert_principal(&mut self, principal: &Principal) -> AppResult<()>;

    /// Persists changes to an existing principal.
    async fn update_principal(&mut self, principal: &Principal) -> AppResult<()>;

    /// Removes a principal together with its tokens and capability assignments.
    async fn delete_principal(&mut self, principal_id: PrincipalId) -> AppResult<()>;

    /// Finds a property by id.
    async fn find_property(&mut self, property_id: PropertyId) -> AppResult<Option<Property>>;

    /// Finds a property group by id.
    async fn find_property_group(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Option<PropertyGroup>>;

    /// Lists every property ordered by name.
    async fn list_properties(&mut self) -> AppResult<Vec<Property>>;

    /// Lists the properties belonging to one group.
    async fn list_group_properties(&mut self, group_id: PropertyGroupId)
    -> AppResult<Vec<Property>>;

    /// Lists every property group ordered by name.
    async fn list_property_groups(&mut self) -> AppResult<Vec<PropertyGroup>>;
}
