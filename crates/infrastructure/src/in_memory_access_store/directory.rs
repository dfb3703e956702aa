use async_trait::async_trait;

use planner_application::DirectoryStore;
use planner_core::{AppError, AppResult};
use planner_domain::{
    EmailAddress, Principal, PrincipalId, Property, PropertyGroup, PropertyGroupId, PropertyId,
};

use super::InMemoryAccessTransaction;

#[async_trait]
impl DirectoryStore for InMemoryAccessTransaction {
    async fn find_principal(&mut self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.staged.principals.get(&principal_id).cloned())
    }

    async fn find_principal_by_email(
        &mut self,
        email: &EmailAddress,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .staged
            .principals
            .values()
            .find(|principal| principal.email == *email)
            .cloned())
    }

    async fn list_principals(&mut self) -> AppResult<Vec<Principal>> {
        let mut principals: Vec<Principal> = self.staged.principals.values().cloned().collect();
        principals.sort_by(|left, right| left.email.as_str().cmp(right.email.as_str()));
        Ok(principals)
    }

    async fn insert_principal(&mut self, principal: &Principal) -> AppResult<()> {
        if self.staged.principals.contains_key(&principal.id) {
            return Err(AppError::Conflict(format!(
                "principal '{}' already exists",
                principal.id
            )));
        }

        if self
            .staged
            .principals
            .values()
            .any(|existing| existing.email == principal.email)
        {
            return Err(AppError::Conflict(format!(
                "email '{}' is already in use",
                principal.email.as_str()
            )));
        }

        self.staged
            .principals
            .insert(principal.id, principal.clone());
        Ok(())
    }

    async fn update_principal(&mut self, principal: &Principal) -> AppResult<()> {
        if self
            .staged
            .principals
            .values()
            .any(|existing| existing.email == principal.email && existing.id != principal.id)
        {
            return Err(AppError::Conflict(format!(
                "email '{}' is already in use",
                principal.email.as_str()
            )));
        }

        let Some(stored) = self.staged.principals.get_mut(&principal.id) else {
            return Err(AppError::NotFound(format!(
                "principal '{}' does not exist",
                principal.id
            )));
        };
        *stored = principal.clone();
        Ok(())
    }

    async fn delete_principal(&mut self, principal_id: PrincipalId) -> AppResult<()> {
        if self.staged.principals.remove(&principal_id).is_none() {
            return Err(AppError::NotFound(format!(
                "principal '{principal_id}' does not exist"
            )));
        }

        self.staged
            .invitation_tokens
            .retain(|token| token.principal_id != principal_id);
        self.staged
            .capability_assignments
            .retain(|(owner, _)| *owner != principal_id);
        Ok(())
    }

    async fn find_property(&mut self, property_id: PropertyId) -> AppResult<Option<Property>> {
        Ok(self.staged.properties.get(&property_id).cloned())
    }

    async fn find_property_group(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Option<PropertyGroup>> {
        Ok(self.staged.property_groups.get(&group_id).cloned())
    }

    async fn list_properties(&mut self) -> AppResult<Vec<Property>> {
        let mut properties: Vec<Property> = self.staged.properties.values().cloned().collect();
        properties.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(properties)
    }

    async fn list_group_properties(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Vec<Property>> {
        let mut properties: Vec<Property> = self
            .staged
            .properties
            .values()
            .filter(|property| property.group_id == Some(group_id))
            .cloned()
            .collect();
        properties.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(properties)
    }

    async fn list_property_groups(&mut self) -> AppResult<Vec<PropertyGroup>> {
        let mut groups: Vec<PropertyGroup> =
            self.staged.property_groups.values().cloned().collect();
        groups.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(groups)
    }
}
