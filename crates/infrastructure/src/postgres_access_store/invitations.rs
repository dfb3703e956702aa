use async_trait::async_trait;
use chrono::{DateTime, Utc};

use planner_application::InvitationTokenStore;
use planner_core::AppResult;
use planner_domain::{InvitationToken, PrincipalId};

use super::rows::InvitationTokenRow;
use super::{PostgresAccessTransaction, database_error, is_serialization_failure};

#[async_trait]
impl InvitationTokenStore for PostgresAccessTransaction {
    async fn insert_invitation_token(&mut self, token: &InvitationToken) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invitation_tokens
                (principal_id, token_hash, issued_at, consumed_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.principal_id.as_uuid())
        .bind(token.token_hash.as_str())
        .bind(token.issued_at)
        .bind(token.consumed_at)
        .bind(token.revoked_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("insert invitation token", error))?;

        Ok(())
    }

    async fn revoke_pending_invitation_tokens(
        &mut self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invitation_tokens
            SET revoked_at = $2
            WHERE principal_id = $1
              AND consumed_at IS NULL
              AND revoked_at IS NULL
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(now)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| database_error("revoke invitation tokens", error))?;

        Ok(result.rows_affected())
    }

    async fn find_invitation_token(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<InvitationToken>> {
        let row = sqlx::query_as::<_, InvitationTokenRow>(
            r#"
            SELECT principal_id, token_hash, issued_at, consumed_at, revoked_at
            FROM invitation_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find invitation token", error))?;

        Ok(row.map(InvitationToken::from))
    }

    async fn mark_invitation_token_consumed(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invitation_tokens
            SET consumed_at = $2
            WHERE token_hash = $1
              AND consumed_at IS NULL
              AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .execute(&mut *self.transaction)
        .await;

        match result {
            Ok(result) => Ok(result.rows_affected() == 1),
            // A concurrent transaction changed the row first.
            Err(error) if is_serialization_failure(&error) => Ok(false),
            Err(error) => Err(database_error("consume invitation token", error)),
        }
    }

    async fn latest_invitation_token(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<InvitationToken>> {
        let row = sqlx::query_as::<_, InvitationTokenRow>(
            r#"
            SELECT principal_id, token_hash, issued_at, consumed_at, revoked_at
            FROM invitation_tokens
            WHERE principal_id = $1
            ORDER BY issued_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| database_error("find latest invitation token", error))?;

        Ok(row.map(InvitationToken::from))
    }

    async fn has_accepted_invitation(&mut self, principal_id: PrincipalId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM invitation_tokens
                WHERE principal_id = $1
                  AND consumed_at IS NOT NULL
            )
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|error| database_error("check accepted invitation", error))
    }
}
