use async_trait::async_trait;
use chrono::{DateTime, Utc};

use planner_application::InvitationTokenStore;
use planner_core::{AppError, AppResult};
use planner_domain::{InvitationToken, PrincipalId};

use super::InMemoryAccessTransaction;

#[async_trait]
impl InvitationTokenStore for InMemoryAccessTransaction {
    async fn insert_invitation_token(&mut self, token: &InvitationToken) -> AppResult<()> {
        if self
            .staged
            .invitation_tokens
            .iter()
            .any(|existing| existing.token_hash == token.token_hash)
        {
            return Err(AppError::Conflict(
                "invitation token hash collision".to_owned(),
            ));
        }

        self.staged.invitation_tokens.push(token.clone());
        Ok(())
    }

    async fn revoke_pending_invitation_tokens(
        &mut self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut revoked = 0;
        for token in self
            .staged
            .invitation_tokens
            .iter_mut()
            .filter(|token| token.principal_id == principal_id && token.is_pending())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn find_invitation_token(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<InvitationToken>> {
        Ok(self
            .staged
            .invitation_tokens
            .iter()
            .find(|token| token.token_hash == token_hash)
            .cloned())
    }

    async fn mark_invitation_token_consumed(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(token) = self
            .staged
            .invitation_tokens
            .iter_mut()
            .find(|token| token.token_hash == token_hash && token.is_pending())
        else {
            return Ok(false);
        };

        token.consumed_at = Some(now);
        Ok(true)
    }

    async fn latest_invitation_token(
        &mut self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<InvitationToken>> {
        Ok(self
            .staged
            .invitation_tokens
            .iter()
            .filter(|token| token.principal_id == principal_id)
            .max_by_key(|token| token.issued_at)
            .cloned())
    }

    async fn has_accepted_invitation(&mut self, principal_id: PrincipalId) -> AppResult<bool> {
        Ok(self
            .staged
            .invitation_tokens
            .iter()
            .any(|token| token.principal_id == principal_id && token.is_consumed()))
    }
}
