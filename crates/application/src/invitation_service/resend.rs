use chrono::{DateTime, Utc};
use tracing::info;

use planner_core::{AppError, AppResult};
use planner_domain::{Action, NoticeKind, PrincipalId};

use super::{InvitationService, IssuedInvitation, issue_invitation};
use crate::access_ports::InvitationTokenStore;
use crate::permission_evaluator::{authorize, load_actor, load_principal};

impl InvitationService {
    /// Issues a fresh invitation for a principal that has not accepted yet.
    ///
    /// Every earlier pending token is revoked and stops working.
    pub async fn resend_invitation(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedInvitation> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let target = load_principal(&mut *transaction, target_id).await?;

        authorize(
            &mut *transaction,
            &actor,
            &Action::ResendInvitation { target: &target },
        )
        .await?;

        if target.is_active {
            return Err(AppError::Conflict(format!(
                "principal '{target_id}' is already active"
            )));
        }
        if transaction.has_accepted_invitation(target.id).await? {
            return Err(AppError::Conflict(format!(
                "principal '{target_id}' already accepted an invitation"
            )));
        }

        let notice = issue_invitation(&mut *transaction, &target, NoticeKind::Resent, now).await?;
        transaction.commit().await?;

        info!(actor_id = %actor.id, principal_id = %target.id, "invitation resent");
        let issued = IssuedInvitation::from(&notice);
        self.dispatch(notice).await;
        Ok(issued)
    }
}
