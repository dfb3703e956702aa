//! PostgreSQL invitation outbox: the notifier writes rows, the worker drains them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use planner_application::InvitationNotifier;
use planner_core::{AppError, AppResult};
use planner_domain::{InvitationNotice, InvitationRoleInfo, NoticeKind, PrincipalId};


/// A claimed outbox row awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    /// Outbox row identifier.
    pub id: i64,
    /// Delivery attempts including the current one.
    pub attempts: i32,
    /// Notice to deliver.
    pub notice: InvitationNotice,
}

/// PostgreSQL implementation of the invitation notifier port.
#[derive(Clone)]
pub struct PostgresInvitationOutbox {
    pool: PgPool,
    lease_seconds: u32,
}

impl PostgresInvitationOutbox {
    /// Creates an outbox whose claims expire after `lease_seconds`.
    #[must_use]
    pub fn new(pool: PgPool, lease_seconds: u32) -> Self {
        Self {
            pool,
            lease_seconds,
        }
    }

    /// Leases up to `limit` pending rows, oldest first.
    ///
    /// Rows whose lease expired are claimable again.
    pub async fn claim_pending(&self, limit: usize) -> AppResult<Vec<OutboxMessage>> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            WITH candidates AS (
                SELECT id
                FROM invitation_outbox
                WHERE status = 'pending'
                   OR (status = 'leased' AND lease_expires_at < now())
                ORDER BY created_at ASC, id ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE invitation_outbox outbox
            SET status = 'leased',
                attempts = outbox.attempts + 1,
                lease_expires_at = now() + make_interval(secs => $2::INT)
            FROM candidates
            WHERE outbox.id = candidates.id
            RETURNING outbox.id, outbox.kind, outbox.principal_id, outbox.email,
                      outbox.token, outbox.expires_at, outbox.role_label,
                      outbox.property_name, outbox.property_group_name, outbox.attempts
            "#,
        )
        .bind(i64::try_from(limit).map_err(|error| {
            AppError::Validation(format!("invalid outbox claim limit: {error}"))
        })?)
        .bind(i32::try_from(self.lease_seconds).map_err(|error| {
            AppError::Validation(format!("invalid outbox lease_seconds: {error}"))
        })?)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to claim outbox rows: {error}")))?;

        rows.into_iter().map(OutboxMessage::try_from).collect()
    }

    /// Marks a row delivered and drops its bearer token.
    pub async fn mark_delivered(&self, id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE invitation_outbox
            SET status = 'delivered',
                token = NULL,
                lease_expires_at = NULL,
                last_error = NULL,
                delivered_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark outbox row delivered: {error}"))
        })?;

        Ok(())
    }

    /// Records a failed attempt; the row is retried until `max_attempts` is reached.
    pub async fn mark_failed(
        &self,
        id: i64,
        error_message: &str,
        max_attempts: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE invitation_outbox
            SET status = CASE WHEN attempts >= $3 THEN 'failed' ELSE 'pending' END,
                token = CASE WHEN attempts >= $3 THEN NULL ELSE token END,
                lease_expires_at = NULL,
                last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(max_attempts)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to mark outbox row failed: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl InvitationNotifier for PostgresInvitationOutbox {
    async fn enqueue(&self, notice: InvitationNotice) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invitation_outbox (
                kind, principal_id, email, token, expires_at,
                role_label, property_name, property_group_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notice.kind.as_str())
        .bind(notice.principal_id.as_uuid())
        .bind(notice.email.as_str())
        .bind(notice.token.as_str())
        .bind(notice.expires_at)
        .bind(notice.role.role_label.as_str())
        .bind(notice.role.property_name.as_deref())
        .bind(notice.role.property_group_name.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to enqueue invitation notice: {error}"))
        })?;

        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    kind: String,
    principal_id: Uuid,
    email: String,
    token: Option<String>,
    expires_at: DateTime<Utc>,
    role_label: String,
    property_name: Option<String>,
    property_group_name: Option<String>,
    attempts: i32,
}

impl TryFrom<OutboxRow> for OutboxMessage {
    type Error = AppError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "invited" => NoticeKind::Invited,
            "resent" => NoticeKind::Resent,
            other => {
                return Err(AppError::Internal(format!(
                    "unknown outbox notice kind '{other}' on row {}",
                    row.id
                )));
            }
        };

        let token = row.token.ok_or_else(|| {
            AppError::Internal(format!("outbox row {} has no token", row.id))
        })?;

        Ok(Self {
            id: row.id,
            attempts: row.attempts,
            notice: InvitationNotice {
                kind,
                principal_id: PrincipalId::from_uuid(row.principal_id),
                email: row.email,
                token,
                expires_at: row.expires_at,
                role: InvitationRoleInfo {
                    role_label: row.role_label,
                    property_name: row.property_name,
                    property_group_name: row.property_group_name,
                },
            },
        })
    }
}
