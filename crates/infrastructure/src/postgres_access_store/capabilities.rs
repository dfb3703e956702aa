use std::collections::BTreeSet;

use async_trait::async_trait;

use planner_application::CapabilityStore;
use planner_core::AppResult;
use planner_domain::{Capability, CapabilityId, PrincipalId};

use super::rows::CapabilityRow;
use super::{PostgresAccessTransaction, database_error};

fn raw_ids(capability_ids: &BTreeSet<CapabilityId>) -> Vec<i64> {
    capability_ids.iter().map(CapabilityId::as_i64).collect()
}

#[async_trait]
impl CapabilityStore for PostgresAccessTransaction {
    async fn find_capabilities(
        &mut self,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<Vec<Capability>> {
        let rows = sqlx::query_as::<_, CapabilityRow>(
            r#"
            SELECT id, slug, name, is_active
            FROM capabilities
            WHERE id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(raw_ids(capability_ids))
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find capabilities", error))?;

        Ok(rows.into_iter().map(Capability::from).collect())
    }

    async fn list_active_capabilities(&mut self) -> AppResult<Vec<Capability>> {
        let rows = sqlx::query_as::<_, CapabilityRow>(
            r#"
            SELECT id, slug, name, is_active
            FROM capabilities
            WHERE is_active
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list active capabilities", error))?;

        Ok(rows.into_iter().map(Capability::from).collect())
    }

    async fn assigned_capability_ids(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<CapabilityId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT capability_id FROM capability_assignments WHERE principal_id = $1",
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| database_error("list capability assignments", error))?;

        Ok(ids.into_iter().map(CapabilityId::new).collect())
    }

    async fn insert_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO capability_assignments (principal_id, capability_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT (principal_id, capability_id) DO NOTHING
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(raw_ids(capability_ids))
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("insert capability assignments", error))?;

        Ok(())
    }

    async fn delete_capability_assignments(
        &mut self,
        principal_id: PrincipalId,
        capability_ids: &BTreeSet<CapabilityId>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM capability_assignments
            WHERE principal_id = $1
              AND capability_id = ANY($2)
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(raw_ids(capability_ids))
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("delete capability assignments", error))?;

        Ok(())
    }
}
