use async_trait::async_trait;
use chrono::{DateTime, Utc};

use planner_core::AppResult;
use planner_domain::{InvitationToken, PrincipalId};

/// Hashed invitation tokens.
#[async_trait]
pub trait InvitationTokenStore: Send {
    /// Stores a freshly issued token.
    async fn insert_invitation_token(&mut self, token: &InvitationToken) -> AppResult<()>;

    /// Revokes every pending token of the principal and returns how many were revoked.
    async fn revoke_pending_invitation_tokens(
        &mut self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Finds a token by the hash of its raw value.
    async fn find_invitation_token(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<InvitationToken>>;

    /// Marks the token consumed only when it is still pending.
    ///
    /// Returns `false` when another caller consumed or revoked it first.
    async fn mark_invitation_token_consumed(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Returns the most recently issued token of the principal.
    async fn latest_invitation_token(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<InvitationToken>>;

    /// Returns whether the principal ever accepted an invitation.
    async fn has_accepted_invitation(&mut self, principal_id: PrincipalId) -> AppResult<bool>;
}
