//! In-process invitation notifier backed by an unbounded tokio channel.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use planner_application::{InvitationMailer, InvitationNotifier};
use planner_core::{AppError, AppResult};
use planner_domain::InvitationNotice;

/// Notifier that hands notices to an in-process consumer without waiting.
#[derive(Clone)]
pub struct ChannelInvitationNotifier {
    sender: mpsc::UnboundedSender<InvitationNotice>,
}

impl ChannelInvitationNotifier {
    /// Creates a notifier and the receiver its notices arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InvitationNotice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl InvitationNotifier for ChannelInvitationNotifier {
    async fn enqueue(&self, notice: InvitationNotice) -> AppResult<()> {
        self.sender.send(notice).map_err(|error| {
            AppError::Internal(format!(
                "failed to enqueue invitation notice for '{}': channel closed",
                error.0.principal_id
            ))
        })
    }
}

/// Delivers every notice arriving on `receiver` until all senders are gone.
///
/// Returns the number of notices delivered.
pub async fn deliver_invitations(
    mut receiver: mpsc::UnboundedReceiver<InvitationNotice>,
    mailer: InvitationMailer,
) -> usize {
    let mut delivered = 0;

    while let Some(notice) = receiver.recv().await {
        match mailer.deliver(&notice).await {
            Ok(()) => delivered += 1,
            Err(error) => warn!(
                principal_id = %notice.principal_id,
                kind = notice.kind.as_str(),
                error = %error,
                "failed to deliver invitation email"
            ),
        }
    }

    delivered
}
