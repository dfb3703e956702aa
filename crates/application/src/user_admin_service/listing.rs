use chrono::{DateTime, Utc};

use planner_core::AppResult;
use planner_domain::{Action, ManageableScopes, Principal, PrincipalId, RoleKind, decide};

use super::{ManagedUser, UserAdministrationService, UserStats};
use crate::access_ports::{AccessTransaction, DirectoryStore};
use crate::invitation_service::invitation_state_of;
use crate::permission_evaluator::{load_actor, role_options};
use crate::scope_resolver::{manageable_scopes, resolve_scope};

impl UserAdministrationService {
    /// Lists the properties and groups the actor may assign users into.
    pub async fn manageable_scopes(&self, actor_id: PrincipalId) -> AppResult<ManageableScopes> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        manageable_scopes(&mut *transaction, &actor).await
    }

    /// Lists the roles the actor may offer when creating or editing users.
    pub async fn role_options(&self, actor_id: PrincipalId) -> AppResult<Vec<RoleKind>> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        Ok(role_options(&actor))
    }

    /// Lists the principals the actor may update, with their lifecycle state.
    pub async fn list_manageable_users(
        &self,
        actor_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ManagedUser>> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;
        let principals = manageable_principals(transaction.as_mut(), &actor).await?;

        let mut users = Vec::with_capacity(principals.len());
        for principal in principals {
            let invitation_state = invitation_state_of(&mut *transaction, &principal, now).await?;
            users.push(ManagedUser {
                principal,
                invitation_state,
            });
        }
        Ok(users)
    }

    /// Counts the principals visible to the actor.
    ///
    /// Superusers see every principal; other actors see the ones they manage.
    pub async fn user_stats(&self, actor_id: PrincipalId) -> AppResult<UserStats> {
        let mut transaction = self.store.begin().await?;
        let actor = load_actor(&mut *transaction, actor_id).await?;

        let visible = if actor.is_superuser() {
            transaction.list_principals().await?
        } else {
            manageable_principals(transaction.as_mut(), &actor).await?
        };

        Ok(visible
            .iter()
            .fold(UserStats::default(), |mut stats, principal| {
                stats.total_users += 1;
                if principal.is_active {
                    stats.active_users += 1;
                }
                match principal.role_kind() {
                    Some(RoleKind::SuperUser | RoleKind::GroupAdmin | RoleKind::PropertyAdmin) => {
                        stats.admin_users += 1;
                    }
                    Some(RoleKind::Tenant) => stats.tenants += 1,
                    None => {}
                }
                stats
            }))
    }
}

/// Principals `actor` could update, decided against one resolved scope.
async fn manageable_principals(
    transaction: &mut dyn AccessTransaction,
    actor: &Principal,
) -> AppResult<Vec<Principal>> {
    let scope = resolve_scope(transaction, actor).await?;
    let principals = transaction.list_principals().await?;

    Ok(principals
        .into_iter()
        .filter(|target| {
            decide(
                actor,
                &scope,
                &Action::Update {
                    target,
                    new_role: None,
                },
            )
            .is_allowed()
        })
        .collect())
}
