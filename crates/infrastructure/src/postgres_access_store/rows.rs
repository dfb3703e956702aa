use chrono::{DateTime, Utc};
use uuid::Uuid;

use planner_core::{AppError, NonEmptyString};
use planner_domain::{
    Capability, CapabilityId, EmailAddress, InvitationToken, Principal, PrincipalId, Property,
    PropertyGroup, PropertyGroupId, PropertyId, Role, RoleKind,
};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PrincipalRow {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    role: Option<String>,
    property_id: Option<i64>,
    property_group_id: Option<i64>,
    created_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = AppError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .map(|value| {
                let kind = value.parse::<RoleKind>()?;
                Role::from_parts(
                    kind,
                    row.property_id.map(PropertyId::new),
                    row.property_group_id.map(PropertyGroupId::new),
                )
            })
            .transpose()?;

        Ok(Self {
            id: PrincipalId::from_uuid(row.id),
            email: EmailAddress::new(row.email)?,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            role,
            created_at: row.created_at,
            activated_at: row.activated_at,
        })
    }
}

/// Splits a role into its `role`, `property_id`, and `property_group_id` columns.
pub(super) fn role_columns(role: Option<Role>) -> (Option<&'static str>, Option<i64>, Option<i64>) {
    match role {
        None => (None, None, None),
        Some(role) => (
            Some(role.kind().as_str()),
            role.property_id().map(|id| id.as_i64()),
            role.group_id().map(|id| id.as_i64()),
        ),
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PropertyRow {
    id: i64,
    name: String,
    property_group_id: Option<i64>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = AppError;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PropertyId::new(row.id),
            name: NonEmptyString::new(row.name)?,
            group_id: row.property_group_id.map(PropertyGroupId::new),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PropertyGroupRow {
    id: i64,
    name: String,
}

impl TryFrom<PropertyGroupRow> for PropertyGroup {
    type Error = AppError;

    fn try_from(row: PropertyGroupRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PropertyGroupId::new(row.id),
            name: NonEmptyString::new(row.name)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct InvitationTokenRow {
    principal_id: Uuid,
    token_hash: String,
    issued_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<InvitationTokenRow> for InvitationToken {
    fn from(row: InvitationTokenRow) -> Self {
        Self {
            principal_id: PrincipalId::from_uuid(row.principal_id),
            token_hash: row.token_hash,
            issued_at: row.issued_at,
            consumed_at: row.consumed_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CapabilityRow {
    id: i64,
    slug: String,
    name: String,
    is_active: bool,
}

impl From<CapabilityRow> for Capability {
    fn from(row: CapabilityRow) -> Self {
        Self {
            id: CapabilityId::new(row.id),
            slug: row.slug,
            name: row.name,
            is_active: row.is_active,
        }
    }
}
