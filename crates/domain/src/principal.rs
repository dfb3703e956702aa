//! Principal (user account) domain types.

use chrono::{DateTime, Utc};
use planner_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, RoleKind};

/// Unique identifier for a principal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    /// Creates a new random principal identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a principal identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// An account in the system.
///
/// The superuser flag is derived from [`Role::SuperUser`], so a superuser can
/// never also carry a scope anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier.
    pub id: PrincipalId,
    /// Unique login email.
    pub email: EmailAddress,
    /// Optional given name.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Role assignment, if one was made.
    pub role: Option<Role>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Most recent activation timestamp.
    pub activated_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// Creates an inactive principal awaiting invitation acceptance.
    #[must_use]
    pub fn new_inactive(
        email: EmailAddress,
        first_name: Option<String>,
        last_name: Option<String>,
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrincipalId::new(),
            email,
            first_name,
            last_name,
            is_active: false,
            role,
            created_at: now,
            activated_at: None,
        }
    }

    /// Returns whether this principal holds the superuser role.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        matches!(self.role, Some(Role::SuperUser))
    }

    /// Returns the role discriminator, if a role is assigned.
    #[must_use]
    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role.as_ref().map(Role::kind)
    }

    /// Marks the principal active.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.is_active = true;
        self.activated_at = Some(now);
    }

    /// Marks the principal inactive.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
