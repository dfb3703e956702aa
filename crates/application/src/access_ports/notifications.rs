use async_trait::async_trait;

use planner_core::AppResult;
use planner_domain::InvitationNotice;

/// Queue for invitation notices. Delivery happens elsewhere.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    /// Queues a notice without waiting for delivery.
    async fn enqueue(&self, notice: InvitationNotice) -> AppResult<()>;
}

/// Port for sending emails. Infrastructure provides SMTP or console implementations.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text or HTML email.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}
