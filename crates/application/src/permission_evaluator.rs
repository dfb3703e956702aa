//! Access checks shared by every mutating service.

use planner_core::{AppError, AppResult};
use planner_domain::{Action, Decision, Grant, Principal, PrincipalId, RoleKind, decide};
use tracing::debug;

use crate::access_ports::DirectoryStore;
use crate::scope_resolver::resolve_scope;

/// Resolves the actor's scope and decides `action`.
pub async fn evaluate<D>(
    directory: &mut D,
    actor: &Principal,
    action: &Action<'_>,
) -> AppResult<Decision>
where
    D: DirectoryStore + ?Sized,
{
    let scope = resolve_scope(directory, actor).await?;
    let decision = decide(actor, &scope, action);

    if let Decision::Deny(denial) = decision {
        debug!(
            actor_id = %actor.id,
            target_id = ?action.target().map(|target| target.id),
            action = action.as_str(),
            code = denial.code(),
            "access denied"
        );
    }

    Ok(decision)
}

/// Like [`evaluate`], converting a denial into an error.
pub async fn authorize<D>(
    directory: &mut D,
    actor: &Principal,
    action: &Action<'_>,
) -> AppResult<Grant>
where
    D: DirectoryStore + ?Sized,
{
    evaluate(directory, actor, action).await?.into_result()
}

/// Roles `actor` may pick when creating or editing another principal.
///
/// Superusers see every role.
#[must_use]
pub fn role_options(actor: &Principal) -> Vec<RoleKind> {
    if actor.is_superuser() {
        return RoleKind::all().to_vec();
    }

    actor
        .role_kind()
        .map(|kind| kind.assignable_roles().to_vec())
        .unwrap_or_default()
}

/// Loads the acting principal. Unknown or inactive actors are unauthorized.
pub(crate) async fn load_actor<D>(directory: &mut D, actor_id: PrincipalId) -> AppResult<Principal>
where
    D: DirectoryStore + ?Sized,
{
    match directory.find_principal(actor_id).await? {
        Some(actor) if actor.is_active => Ok(actor),
        _ => Err(AppError::Unauthorized(format!(
            "principal '{actor_id}' is not an active account"
        ))),
    }
}

/// Loads a target principal or fails with not found.
pub(crate) async fn load_principal<D>(
    directory: &mut D,
    principal_id: PrincipalId,
) -> AppResult<Principal>
where
    D: DirectoryStore + ?Sized,
{
    directory
        .find_principal(principal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("principal '{principal_id}' does not exist")))
}
