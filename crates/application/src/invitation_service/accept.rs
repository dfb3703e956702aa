use chrono::{DateTime, Utc};
use tracing::info;

use planner_core::{AppResult, Denial};
use planner_domain::Principal;

use super::InvitationService;
use super::token_crypto::hash_token;
use crate::access_ports::{DirectoryStore, InvitationTokenStore};
use crate::permission_evaluator::load_principal;

impl InvitationService {
    /// Accepts an invitation and activates its principal.
    ///
    /// Consumption is a compare-and-set, so concurrent accepts of the same
    /// token yield exactly one success; the others see `TOKEN_ALREADY_CONSUMED`.
    pub async fn accept_invitation(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Principal> {
        let token_hash = hash_token(raw_token.trim());
        let mut transaction = self.store.begin().await?;

        let token = transaction
            .find_invitation_token(&token_hash)
            .await?
            .ok_or(Denial::TokenNotFound)?;
        token.check_acceptable(now)?;

        if !transaction
            .mark_invitation_token_consumed(&token_hash, now)
            .await?
        {
            return Err(Denial::TokenAlreadyConsumed.into());
        }

        let mut principal = load_principal(&mut *transaction, token.principal_id).await?;
        principal.activate(now);
        transaction.update_principal(&principal).await?;
        transaction.commit().await?;

        info!(principal_id = %principal.id, "invitation accepted");
        Ok(principal)
    }
}
