use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AppError;

/// Recoverable, user-actionable rejections raised by the access core.
///
/// Each variant carries a stable code that callers surface verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Denial {
    /// The actor attempted a guarded action on its own account.
    #[error("SELF_MODIFICATION_FORBIDDEN: principals cannot perform this action on themselves")]
    SelfModificationForbidden,
    /// The actor's role may not assign or manage the target role.
    #[error("ROLE_NOT_ASSIGNABLE: actor role cannot assign or manage the target role")]
    RoleNotAssignable,
    /// The target lies outside the actor's resolved scope.
    #[error("OUT_OF_SCOPE: target lies outside the actor's scope")]
    OutOfScope,
    /// A capability id is unknown or inactive.
    #[error("INVALID_CAPABILITY: capability is unknown or inactive")]
    InvalidCapability,
    /// No live invitation token matches the presented value.
    #[error("TOKEN_NOT_FOUND: invitation token is invalid")]
    TokenNotFound,
    /// The invitation token is past its validity window.
    #[error("TOKEN_EXPIRED: invitation has expired, request a new invitation")]
    TokenExpired,
    /// The invitation token was already used.
    #[error("TOKEN_ALREADY_CONSUMED: invitation has already been accepted")]
    TokenAlreadyConsumed,
    /// Manual activation was requested for a principal that never accepted.
    #[error("INVITATION_NOT_ACCEPTED: user must accept their invitation before activation")]
    InvitationNotAccepted,
}

impl Denial {
    /// Returns the stable wire code for this denial.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfModificationForbidden => "SELF_MODIFICATION_FORBIDDEN",
            Self::RoleNotAssignable => "ROLE_NOT_ASSIGNABLE",
            Self::OutOfScope => "OUT_OF_SCOPE",
            Self::InvalidCapability => "INVALID_CAPABILITY",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenAlreadyConsumed => "TOKEN_ALREADY_CONSUMED",
            Self::InvitationNotAccepted => "INVITATION_NOT_ACCEPTED",
        }
    }

    /// Returns all denial codes.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Denial] = &[
            Denial::SelfModificationForbidden,
            Denial::RoleNotAssignable,
            Denial::OutOfScope,
            Denial::InvalidCapability,
            Denial::TokenNotFound,
            Denial::TokenExpired,
            Denial::TokenAlreadyConsumed,
            Denial::InvitationNotAccepted,
        ];

        ALL
    }
}

impl FromStr for Denial {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|denial| denial.code() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown denial code '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Denial;

    #[test]
    fn codes_parse_back_to_the_same_denial() {
        for denial in Denial::all() {
            assert_eq!(Denial::from_str(denial.code()).ok(), Some(*denial));
        }
    }

    #[test]
    fn serde_uses_wire_codes() {
        let encoded = serde_json::to_string(&Denial::TokenAlreadyConsumed);
        assert_eq!(
            encoded.ok().as_deref(),
            Some("\"TOKEN_ALREADY_CONSUMED\"")
        );
    }
}
