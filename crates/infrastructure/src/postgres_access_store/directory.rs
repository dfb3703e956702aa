use async_trait::async_trait;

use planner_application::DirectoryStore;
use planner_core::{AppError, AppResult};
use planner_domain::{
    EmailAddress, Principal, PrincipalId, Property, PropertyGroup, PropertyGroupId, PropertyId,
};

use super::rows::{PrincipalRow, PropertyGroupRow, PropertyRow, role_columns};
use super::{PostgresAccessTransaction, database_error};

const PRINCIPAL_COLUMNS: &str = "id, email, first_name, last_name, is_active, role, \
     property_id, property_group_id, created_at, activated_at";

#[async_trait]
impl DirectoryStore for PostgresAccessTransaction {
    async fn find_principal(&mut self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id = $1"
        ))
        .bind(principal_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find principal", error))?;

        row.map(Principal::try_from).transpose()
    }

    async fn find_principal_by_email(
        &mut self,
        email: &EmailAddress,
    ) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find principal by email", error))?;

        row.map(Principal::try_from).transpose()
    }

    async fn list_principals(&mut self) -> AppResult<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals ORDER BY email ASC"
        ))
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list principals", error))?;

        rows.into_iter().map(Principal::try_from).collect()
    }

    async fn insert_principal(&mut self, principal: &Principal) -> AppResult<()> {
        let (role, property_id, property_group_id) = role_columns(principal.role);

        sqlx::query(
            r#"
            INSERT INTO principals (
                id, email, first_name, last_name, is_active, role,
                property_id, property_group_id, created_at, activated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(principal.email.as_str())
        .bind(principal.first_name.as_deref())
        .bind(principal.last_name.as_deref())
        .bind(principal.is_active)
        .bind(role)
        .bind(property_id)
        .bind(property_group_id)
        .bind(principal.created_at)
        .bind(principal.activated_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("insert principal", error))?;

        Ok(())
    }

    async fn update_principal(&mut self, principal: &Principal) -> AppResult<()> {
        let (role, property_id, property_group_id) = role_columns(principal.role);

        let result = sqlx::query(
            r#"
            UPDATE principals
            SET email = $2,
                first_name = $3,
                last_name = $4,
                is_active = $5,
                role = $6,
                property_id = $7,
                property_group_id = $8,
                activated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(principal.email.as_str())
        .bind(principal.first_name.as_deref())
        .bind(principal.last_name.as_deref())
        .bind(principal.is_active)
        .bind(role)
        .bind(property_id)
        .bind(property_group_id)
        .bind(principal.activated_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("update principal", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{}' does not exist",
                principal.id
            )));
        }

        Ok(())
    }

    async fn delete_principal(&mut self, principal_id: PrincipalId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM principals WHERE id = $1")
            .bind(principal_id.as_uuid())
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| database_error("delete principal", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{principal_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn find_property(&mut self, property_id: PropertyId) -> AppResult<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(
            "SELECT id, name, property_group_id FROM properties WHERE id = $1",
        )
        .bind(property_id.as_i64())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find property", error))?;

        row.map(Property::try_from).transpose()
    }

    async fn find_property_group(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Option<PropertyGroup>> {
        let row = sqlx::query_as::<_, PropertyGroupRow>(
            "SELECT id, name FROM property_groups WHERE id = $1",
        )
        .bind(group_id.as_i64())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find property group", error))?;

        row.map(PropertyGroup::try_from).transpose()
    }

    async fn list_properties(&mut self) -> AppResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            "SELECT id, name, property_group_id FROM properties ORDER BY name ASC, id ASC",
        )
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list properties", error))?;

        rows.into_iter().map(Property::try_from).collect()
    }

    async fn list_group_properties(
        &mut self,
        group_id: PropertyGroupId,
    ) -> AppResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, property_group_id
            FROM properties
            WHERE property_group_id = $1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(group_id.as_i64())
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list group properties", error))?;

        rows.into_iter().map(Property::try_from).collect()
    }

    async fn list_property_groups(&mut self) -> AppResult<Vec<PropertyGroup>> {
        let rows = sqlx::query_as::<_, PropertyGroupRow>(
            "SELECT id, name FROM property_groups ORDER BY name ASC, id ASC",
        )
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list property groups", error))?;

        rows.into_iter().map(PropertyGroup::try_from).collect()
    }
}
