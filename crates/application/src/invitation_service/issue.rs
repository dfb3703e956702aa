use chrono::{DateTime, Utc};

use planner_core::AppResult;
use planner_domain::{
    InvitationNotice, InvitationRoleInfo, InvitationToken, NoticeKind, Principal, Role,
};

use super::token_crypto::generate_token;
use crate::access_ports::{DirectoryStore, InvitationTokenStore};

/// Revokes pending tokens of `principal` and stores a fresh one.
///
/// Returns the notice to dispatch once the surrounding transaction commits.
pub(crate) async fn issue_invitation<T>(
    store: &mut T,
    principal: &Principal,
    kind: NoticeKind,
    now: DateTime<Utc>,
) -> AppResult<InvitationNotice>
where
    T: DirectoryStore + InvitationTokenStore + ?Sized,
{
    store
        .revoke_pending_invitation_tokens(principal.id, now)
        .await?;

    let (raw_token, token_hash) = generate_token()?;
    let token = InvitationToken::issue(principal.id, token_hash, now);
    store.insert_invitation_token(&token).await?;
    let role = describe_role(store, principal.role).await?;

    Ok(InvitationNotice {
        kind,
        principal_id: principal.id,
        email: principal.email.as_str().to_owned(),
        token: raw_token,
        expires_at: token.expires_at(),
        role,
    })
}

/// Resolves the role label and anchor names shown in the invitation email.
async fn describe_role<D>(
    directory: &mut D,
    role: Option<Role>,
) -> AppResult<InvitationRoleInfo>
where
    D: DirectoryStore + ?Sized,
{
    let Some(role) = role else {
        return Ok(InvitationRoleInfo::unassigned());
    };

    let (property_name, property_group_name) = match role {
        Role::SuperUser => (None, None),
        Role::GroupAdmin(group_id) => {
            let group = directory.find_property_group(group_id).await?;
            (None, group.map(|group| String::from(group.name)))
        }
        Role::PropertyAdmin(property_id) | Role::Tenant(property_id) => {
            match directory.find_property(property_id).await? {
                Some(property) => {
                    let group = match property.group_id {
                        Some(group_id) => directory.find_property_group(group_id).await?,
                        None => None,
                    };
                    (
                        Some(String::from(property.name)),
                        group.map(|group| String::from(group.name)),
                    )
                }
                None => (None, None),
            }
        }
    };

    Ok(InvitationRoleInfo {
        role_label: role.kind().label().to_owned(),
        property_name,
        property_group_name,
    })
}
