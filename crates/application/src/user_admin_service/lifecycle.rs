use chrono::{DateTime, Utc};
use tracing::info;

use planner_core::{AppError, AppResult};
use planner_domain::{Action, EmailAddress, Grant, NoticeKind, Principal, PrincipalId};

use super::{
    CreateUserInput, CreatedUser, UpdateUserInput, UserAdministrationService,
    ensure_anchor_exists, normalize_name,
};
use crate::access_ports::{DirectoryStore, InvitationTokenStore};
use crate::invitation_service::{IssuedInvitation, deactivate, issue_invitation, manually_activate};
use crate::permission_evaluator::{authorize, load_actor, load_principal};

impl UserAdministrationService {
    /// Creates an inactive principal and invites it.
    ///
    /// The invitation notice is queued after commit; a queueing failure is
    /// logged and does not fail the creation.
    pub async fn create_user(
        &self,
        actor_id: PrincipalId,
        input: CreateUserInput,
        now: DateTime<Utc>,
    ) -> AppResult<CreatedUser> {
        let email = EmailAddress::new(input.email)?;

        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        authorize(&mut *transaction, &actor, &Action::Create { role: input.role }).await?;
        ensure_anchor_exists(&mut *transaction, input.role).await?;

        if transaction.find_principal_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email '{}' is already in use",
                email.as_str()
            )));
        }

        let principal = Principal::new_inactive(
            email,
            normalize_name(input.first_name),
            normalize_name(input.last_name),
            Some(input.role),
            now,
        );
        transaction.insert_principal(&principal).await?;
        let notice =
            issue_invitation(&mut *transaction, &principal, NoticeKind::Invited, now).await?;
        transaction.commit().await?;

        info!(
            actor_id = %actor.id,
            principal_id = %principal.id,
            role = principal.role.map(|role| role.kind().as_str()),
            "user created"
        );

        let invitation = IssuedInvitation::from(&notice);
        self.invitations.dispatch(notice).await;

        Ok(CreatedUser {
            principal,
            invitation,
        })
    }

    /// Updates another principal, optionally changing its email or role.
    pub async fn update_user(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        input: UpdateUserInput,
    ) -> AppResult<Principal> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let mut target = load_principal(&mut *transaction, target_id).await?;

        authorize(
            &mut *transaction,
            &actor,
            &Action::Update {
                target: &target,
                new_role: input.role,
            },
        )
        .await?;

        if let Some(role) = input.role {
            ensure_anchor_exists(&mut *transaction, role).await?;
            target.role = Some(role);
        }

        if let Some(email) = input.email {
            let email = EmailAddress::new(email)?;
            let taken = transaction
                .find_principal_by_email(&email)
                .await?
                .is_some_and(|existing| existing.id != target.id);
            if taken {
                return Err(AppError::Conflict(format!(
                    "email '{}' is already in use",
                    email.as_str()
                )));
            }
            target.email = email;
        }

        if let Some(first_name) = input.first_name {
            target.first_name = normalize_name(Some(first_name));
        }
        if let Some(last_name) = input.last_name {
            target.last_name = normalize_name(Some(last_name));
        }

        transaction.update_principal(&target).await?;
        transaction.commit().await?;

        info!(actor_id = %actor.id, principal_id = %target.id, "user updated");
        Ok(target)
    }

    /// Deletes another principal.
    ///
    /// Superusers remove the record; everyone else only clears the active flag
    /// and revokes pending invitations, so an outstanding link cannot undo it.
    pub async fn delete_user(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Grant> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let mut target = load_principal(&mut *transaction, target_id).await?;

        let grant =
            authorize(&mut *transaction, &actor, &Action::Delete { target: &target }).await?;
        match grant {
            Grant::HardDelete => transaction.delete_principal(target.id).await?,
            Grant::SoftDelete | Grant::Proceed => {
                target.deactivate();
                transaction.update_principal(&target).await?;
                transaction
                    .revoke_pending_invitation_tokens(target.id, now)
                    .await?;
            }
        }
        transaction.commit().await?;

        info!(
            actor_id = %actor.id,
            principal_id = %target.id,
            hard = grant == Grant::HardDelete,
            "user deleted"
        );
        Ok(grant)
    }

    /// Re-activates a principal that accepted an invitation earlier.
    pub async fn activate_user(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Principal> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let mut target = load_principal(&mut *transaction, target_id).await?;

        authorize(&mut *transaction, &actor, &Action::Activate { target: &target }).await?;
        manually_activate(&mut *transaction, &mut target, now).await?;
        transaction.update_principal(&target).await?;
        transaction.commit().await?;

        info!(actor_id = %actor.id, principal_id = %target.id, "user activated");
        Ok(target)
    }

    /// Deactivates another principal.
    pub async fn deactivate_user(
        &self,
        actor_id: PrincipalId,
        target_id: PrincipalId,
    ) -> AppResult<Principal> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let mut target = load_principal(&mut *transaction, target_id).await?;

        authorize(&mut *transaction, &actor, &Action::Deactivate { target: &target }).await?;
        deactivate(&mut target)?;
        transaction.update_principal(&target).await?;
        transaction.commit().await?;

        info!(actor_id = %actor.id, principal_id = %target.id, "user deactivated");
        Ok(target)
    }
}
