//! Invitation lifecycle: issuing, resending, accepting, and manual activation.
//!
//! Tokens are random, stored only as SHA-256 hashes, single-use, and valid for
//! a fixed window. Notices are queued only after the state change committed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use planner_domain::{InvitationNotice, PrincipalId};

use crate::access_ports::{AccessStore, InvitationNotifier};

mod accept;
mod activation;
mod issue;
mod resend;
mod token_crypto;


pub(crate) use activation::{deactivate, invitation_state_of, manually_activate};
pub(crate) use issue::issue_invitation;

/// Public summary of an issued invitation. The raw token is never included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuedInvitation {
    /// Invited principal.
    pub principal_id: PrincipalId,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
}

impl From<&InvitationNotice> for IssuedInvitation {
    fn from(notice: &InvitationNotice) -> Self {
        Self {
            principal_id: notice.principal_id,
            expires_at: notice.expires_at,
        }
    }
}

/// Application service for the invitation lifecycle.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn AccessStore>,
    notifier: Arc<dyn InvitationNotifier>,
}

impl InvitationService {
    /// Creates a new invitation service.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, notifier: Arc<dyn InvitationNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Hands a committed notice to the notifier.
    ///
    /// Enqueue failures are logged and swallowed; the transition already committed.
    pub(crate) async fn dispatch(&self, notice: InvitationNotice) {
        let principal_id = notice.principal_id;
        let kind = notice.kind;

        if let Err(error) = self.notifier.enqueue(notice).await {
            warn!(
                %principal_id,
                kind = kind.as_str(),
                %error,
                "failed to enqueue invitation notice"
            );
        }
    }
}
