use chrono::{DateTime, Utc};

use planner_core::{AppError, AppResult, Denial};
use planner_domain::{InvitationState, Principal, invitation_state};

use crate::access_ports::InvitationTokenStore;

/// Re-activates a principal that accepted an invitation before.
///
/// Applies to superuser actors too: no account becomes active without an
/// accepted invitation.
pub(crate) async fn manually_activate<T>(
    tokens: &mut T,
    target: &mut Principal,
    now: DateTime<Utc>,
) -> AppResult<()>
where
    T: InvitationTokenStore + ?Sized,
{
    if target.is_active {
        return Err(AppError::Conflict(format!(
            "principal '{}' is already active",
            target.id
        )));
    }

    if !tokens.has_accepted_invitation(target.id).await? {
        return Err(Denial::InvitationNotAccepted.into());
    }

    target.activate(now);
    Ok(())
}

/// Clears the active flag.
pub(crate) fn deactivate(target: &mut Principal) -> AppResult<()> {
    if !target.is_active {
        return Err(AppError::Conflict(format!(
            "principal '{}' is already inactive",
            target.id
        )));
    }

    target.deactivate();
    Ok(())
}

/// Derives the lifecycle state of `principal` from its latest token.
pub(crate) async fn invitation_state_of<T>(
    tokens: &mut T,
    principal: &Principal,
    now: DateTime<Utc>,
) -> AppResult<InvitationState>
where
    T: InvitationTokenStore + ?Sized,
{
    let latest = tokens.latest_invitation_token(principal.id).await?;
    Ok(invitation_state(principal, latest.as_ref(), now))
}
