//! End-to-end access flows over the in-memory store.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use planner_application::{
    CapabilityService, CreateUserInput, EmailService, InvitationMailer, UserAdministrationService,
};
use planner_core::{AppError, AppResult, Denial, NonEmptyString};
use planner_domain::{
    Capability, CapabilityId, EmailAddress, InvitationNotice, InvitationState, Principal,
    PrincipalId, Property, PropertyGroup, PropertyGroupId, PropertyId, Role,
};
use planner_infrastructure::{ChannelInvitationNotifier, InMemoryAccessStore, deliver_invitations};
use tokio::sync::mpsc::UnboundedReceiver;

const WATERFRONT: PropertyGroupId = PropertyGroupId::new(1);
const UPTOWN: PropertyGroupId = PropertyGroupId::new(2);
const HARBOR_VIEW: PropertyId = PropertyId::new(10);
const LAKESIDE: PropertyId = PropertyId::new(11);
const MIDTOWN_LOFTS: PropertyId = PropertyId::new(20);
const PLANNER: CapabilityId = CapabilityId::new(1);
const REPORTS: CapabilityId = CapabilityId::new(2);
const LEGACY: CapabilityId = CapabilityId::new(3);

fn name(value: &str) -> NonEmptyString {
    match NonEmptyString::new(value) {
        Ok(name) => name,
        Err(error) => panic!("fixture name rejected: {error}"),
    }
}

fn email(value: &str) -> EmailAddress {
    match EmailAddress::new(value) {
        Ok(email) => email,
        Err(error) => panic!("fixture email rejected: {error}"),
    }
}

struct Portfolio {
    store: InMemoryAccessStore,
    superuser: PrincipalId,
}

impl Portfolio {
    async fn new() -> Self {
        let store = InMemoryAccessStore::new();
        for (id, group_name) in [(WATERFRONT, "Waterfront"), (UPTOWN, "Uptown")] {
            store
                .save_property_group(PropertyGroup {
                    id,
                    name: name(group_name),
                })
                .await;
        }
        for (id, property_name, group_id) in [
            (HARBOR_VIEW, "Harbor View", WATERFRONT),
            (LAKESIDE, "Lakeside", WATERFRONT),
            (MIDTOWN_LOFTS, "Midtown Lofts", UPTOWN),
        ] {
            Self::place(&store, id, property_name, group_id).await;
        }
        for (id, slug, is_active) in [
            (PLANNER, "planner", true),
            (REPORTS, "reports", true),
            (LEGACY, "legacy", false),
        ] {
            store
                .save_capability(Capability {
                    id,
                    slug: slug.to_owned(),
                    name: slug.to_owned(),
                    is_active,
                })
                .await;
        }

        let mut portfolio = Self {
            store,
            superuser: PrincipalId::new(),
        };
        portfolio.superuser = portfolio
            .seed_active("root@example.com", Role::SuperUser)
            .await;
        portfolio
    }

    async fn place(
        store: &InMemoryAccessStore,
        id: PropertyId,
        property_name: &str,
        group_id: PropertyGroupId,
    ) {
        let saved = store
            .save_property(Property {
                id,
                name: name(property_name),
                group_id: Some(group_id),
            })
            .await;
        assert!(saved.is_ok());
    }

    async fn seed_active(&self, address: &str, role: Role) -> PrincipalId {
        let mut principal =
            Principal::new_inactive(email(address), None, None, Some(role), Utc::now());
        principal.activate(Utc::now());
        let id = principal.id;
        assert!(self.store.seed_principal(principal).await.is_ok());
        id
    }

    fn users(&self) -> (UserAdministrationService, UnboundedReceiver<InvitationNotice>) {
        let (notifier, notices) = ChannelInvitationNotifier::channel();
        let users =
            UserAdministrationService::new(Arc::new(self.store.clone()), Arc::new(notifier));
        (users, notices)
    }

    fn capabilities(&self) -> CapabilityService {
        CapabilityService::new(Arc::new(self.store.clone()))
    }
}

fn tenant_input(address: &str, property_id: PropertyId) -> CreateUserInput {
    CreateUserInput {
        email: address.to_owned(),
        first_name: Some("  Tess ".to_owned()),
        last_name: None,
        role: Role::Tenant(property_id),
    }
}

async fn invite(
    users: &UserAdministrationService,
    notices: &mut UnboundedReceiver<InvitationNotice>,
    actor_id: PrincipalId,
    input: CreateUserInput,
) -> (Principal, String) {
    let created = match users.create_user(actor_id, input, Utc::now()).await {
        Ok(created) => created,
        Err(error) => panic!("create_user failed: {error}"),
    };
    let Ok(notice) = notices.try_recv() else {
        panic!("no invitation notice was queued");
    };
    assert_eq!(notice.principal_id, created.principal.id);
    assert_eq!(notice.expires_at, created.invitation.expires_at);

    (created.principal, notice.token)
}

fn denial<T>(result: AppResult<T>) -> Option<Denial> {
    result.err().and_then(|error| error.denial())
}

#[derive(Default)]
struct RecordingEmailService {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingEmailService {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to.to_owned(), subject.to_owned(), text_body.to_owned()));
        Ok(())
    }
}

#[tokio::test]
async fn emailed_link_activates_the_invited_tenant() {
    let portfolio = Portfolio::new().await;
    let (users, notices) = portfolio.users();

    let created = users
        .create_user(
            portfolio.superuser,
            tenant_input("Tess@Example.com", HARBOR_VIEW),
            Utc::now(),
        )
        .await;
    let Ok(created) = created else {
        panic!("create_user failed");
    };
    assert!(!created.principal.is_active);
    assert_eq!(created.principal.email.as_str(), "tess@example.com");
    assert_eq!(created.principal.first_name.as_deref(), Some("Tess"));
    drop(users);

    let email_service = Arc::new(RecordingEmailService::default());
    let mailer = InvitationMailer::new(email_service.clone(), "https://planner.example.com/");
    assert_eq!(deliver_invitations(notices, mailer).await, 1);

    let sent = email_service.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "tess@example.com");
    let body = &sent[0].2;
    assert!(body.contains("Role: Tenant\n"));
    assert!(body.contains("Property: Harbor View\n"));
    assert!(body.contains("Property group: Waterfront\n"));
    let Some(link) = sent[0]
        .2
        .split_whitespace()
        .find(|word| word.starts_with("https://planner.example.com/accept-invitation/"))
    else {
        panic!("email did not contain an acceptance link");
    };
    let raw_token = link.trim_start_matches("https://planner.example.com/accept-invitation/");

    let (users, _notices) = portfolio.users();
    let accepted = users
        .invitations()
        .accept_invitation(raw_token, Utc::now())
        .await;
    assert!(accepted.is_ok_and(|principal| principal.is_active));

    let listed = users
        .list_manageable_users(portfolio.superuser, Utc::now())
        .await
        .unwrap_or_default();
    assert!(listed.iter().any(|user| {
        user.principal.id == created.principal.id
            && user.invitation_state == InvitationState::Accepted
    }));
}

#[tokio::test]
async fn concurrent_accepts_have_a_single_winner() {
    let portfolio = Portfolio::new().await;
    let (users, mut notices) = portfolio.users();
    let (_, raw_token) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("race@example.com", LAKESIDE),
    )
    .await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let invitations = users.invitations().clone();
        let raw_token = raw_token.clone();
        handles.push(tokio::spawn(async move {
            invitations.accept_invitation(&raw_token, Utc::now()).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => successes += 1,
            Ok(Err(error)) => assert_eq!(error.denial(), Some(Denial::TokenAlreadyConsumed)),
            Err(error) => panic!("accept task panicked: {error}"),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn resend_invalidates_earlier_links() {
    let portfolio = Portfolio::new().await;
    let (users, mut notices) = portfolio.users();
    let (invitee, first_token) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("resend@example.com", HARBOR_VIEW),
    )
    .await;

    let resent = users
        .invitations()
        .resend_invitation(portfolio.superuser, invitee.id, Utc::now())
        .await;
    assert!(resent.is_ok());
    let Ok(second) = notices.try_recv() else {
        panic!("no resend notice was queued");
    };

    let stale = users
        .invitations()
        .accept_invitation(&first_token, Utc::now())
        .await;
    assert_eq!(denial(stale), Some(Denial::TokenNotFound));

    let fresh = users
        .invitations()
        .accept_invitation(&second.token, Utc::now())
        .await;
    assert!(fresh.is_ok());

    let again = users
        .invitations()
        .resend_invitation(portfolio.superuser, invitee.id, Utc::now())
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn expired_link_is_rejected_until_resent() {
    let portfolio = Portfolio::new().await;
    let (users, mut notices) = portfolio.users();
    let (invitee, raw_token) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("late@example.com", LAKESIDE),
    )
    .await;

    let later = Utc::now() + Duration::days(8);
    let expired = users
        .invitations()
        .accept_invitation(&raw_token, later)
        .await;
    assert_eq!(denial(expired), Some(Denial::TokenExpired));

    let listed = users
        .list_manageable_users(portfolio.superuser, later)
        .await
        .unwrap_or_default();
    assert!(listed.iter().any(|user| {
        user.principal.id == invitee.id && user.invitation_state == InvitationState::Expired
    }));

    assert!(
        users
            .invitations()
            .resend_invitation(portfolio.superuser, invitee.id, later)
            .await
            .is_ok()
    );
    let Ok(fresh) = notices.try_recv() else {
        panic!("no resend notice was queued");
    };
    let accepted = users
        .invitations()
        .accept_invitation(&fresh.token, later + Duration::hours(1))
        .await;
    assert!(accepted.is_ok());
}

#[tokio::test]
async fn closed_notifier_does_not_fail_creation() {
    let portfolio = Portfolio::new().await;
    let (users, notices) = portfolio.users();
    drop(notices);

    let created = users
        .create_user(
            portfolio.superuser,
            tenant_input("quiet@example.com", HARBOR_VIEW),
            Utc::now(),
        )
        .await;
    assert!(created.is_ok());

    let stats = users.user_stats(portfolio.superuser).await;
    assert_eq!(stats.ok().map(|stats| stats.total_users), Some(2));
}

#[tokio::test]
async fn group_admin_scope_follows_property_moves() {
    let portfolio = Portfolio::new().await;
    let group_admin = portfolio
        .seed_active("waterfront@example.com", Role::GroupAdmin(WATERFRONT))
        .await;
    let (users, mut notices) = portfolio.users();

    invite(
        &users,
        &mut notices,
        group_admin,
        tenant_input("inside@example.com", HARBOR_VIEW),
    )
    .await;

    let outside = users
        .create_user(
            group_admin,
            tenant_input("outside@example.com", MIDTOWN_LOFTS),
            Utc::now(),
        )
        .await;
    assert_eq!(denial(outside), Some(Denial::OutOfScope));

    let peer = users
        .create_user(
            group_admin,
            CreateUserInput {
                email: "peer@example.com".to_owned(),
                first_name: None,
                last_name: None,
                role: Role::GroupAdmin(WATERFRONT),
            },
            Utc::now(),
        )
        .await;
    assert_eq!(denial(peer), Some(Denial::RoleNotAssignable));

    Portfolio::place(&portfolio.store, MIDTOWN_LOFTS, "Midtown Lofts", WATERFRONT).await;

    invite(
        &users,
        &mut notices,
        group_admin,
        tenant_input("moved@example.com", MIDTOWN_LOFTS),
    )
    .await;

    let scopes = users.manageable_scopes(group_admin).await;
    let Ok(scopes) = scopes else {
        panic!("manageable_scopes failed");
    };
    assert!(!scopes.can_manage_all);
    let mut property_ids: Vec<PropertyId> =
        scopes.properties.iter().map(|property| property.id).collect();
    property_ids.sort();
    assert_eq!(property_ids, vec![HARBOR_VIEW, LAKESIDE, MIDTOWN_LOFTS]);

    let managed = users
        .list_manageable_users(group_admin, Utc::now())
        .await
        .unwrap_or_default();
    assert_eq!(managed.len(), 2);
    assert!(managed.iter().all(|user| user.principal.id != group_admin));
}

#[tokio::test]
async fn capability_sync_after_assign_keeps_only_the_requested_set() {
    let portfolio = Portfolio::new().await;
    let (users, mut notices) = portfolio.users();
    let capabilities = portfolio.capabilities();
    let (invitee, _) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("caps@example.com", LAKESIDE),
    )
    .await;

    let assigned = capabilities
        .assign_capabilities(portfolio.superuser, invitee.id, &[PLANNER, REPORTS])
        .await;
    assert_eq!(assigned.ok().map(|ids| ids.len()), Some(2));

    let rejected = capabilities
        .assign_capabilities(portfolio.superuser, invitee.id, &[PLANNER, LEGACY])
        .await;
    assert_eq!(denial(rejected), Some(Denial::InvalidCapability));

    let synced = capabilities
        .sync_capabilities(portfolio.superuser, invitee.id, &[REPORTS])
        .await;
    assert_eq!(
        synced.ok().map(|ids| ids.into_iter().collect::<Vec<_>>()),
        Some(vec![REPORTS])
    );

    let effective = capabilities
        .effective_capabilities(invitee.id)
        .await
        .unwrap_or_default();
    assert_eq!(
        effective.iter().map(|capability| capability.id).collect::<Vec<_>>(),
        vec![REPORTS]
    );

    let own = capabilities
        .assign_capabilities(invitee.id, invitee.id, &[PLANNER])
        .await;
    assert!(own.is_err());

    let superuser_capabilities = capabilities
        .effective_capabilities(portfolio.superuser)
        .await
        .unwrap_or_default();
    assert_eq!(
        superuser_capabilities
            .iter()
            .map(|capability| capability.id)
            .collect::<Vec<_>>(),
        vec![PLANNER, REPORTS]
    );
}

#[tokio::test]
async fn manual_activation_requires_an_accepted_invitation() {
    let portfolio = Portfolio::new().await;
    let (users, mut notices) = portfolio.users();
    let (accepted, raw_token) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("accepted@example.com", HARBOR_VIEW),
    )
    .await;
    let (pending, _) = invite(
        &users,
        &mut notices,
        portfolio.superuser,
        tenant_input("pending@example.com", HARBOR_VIEW),
    )
    .await;

    let accepted_at = Utc::now();
    assert!(
        users
            .invitations()
            .accept_invitation(&raw_token, accepted_at)
            .await
            .is_ok()
    );
    assert!(
        users
            .deactivate_user(portfolio.superuser, accepted.id)
            .await
            .is_ok()
    );

    let reactivated = users
        .activate_user(portfolio.superuser, accepted.id, accepted_at + Duration::hours(1))
        .await;
    assert!(reactivated.is_ok_and(|principal| principal.is_active));

    let never_accepted = users
        .activate_user(portfolio.superuser, pending.id, Utc::now())
        .await;
    assert_eq!(denial(never_accepted), Some(Denial::InvitationNotAccepted));

    let listed = users
        .list_manageable_users(portfolio.superuser, Utc::now())
        .await
        .unwrap_or_default();
    assert!(listed.iter().any(|user| {
        user.principal.id == accepted.id
            && user.invitation_state == InvitationState::ManuallyActivated
    }));
}
