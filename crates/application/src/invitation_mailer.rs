//! Renders invitation notices into emails and sends them.

use std::sync::Arc;

use planner_core::AppResult;
use planner_domain::{INVITATION_VALIDITY_DAYS, InvitationNotice, InvitationRoleInfo, NoticeKind};

use crate::access_ports::EmailService;

/// Turns queued invitation notices into plain-text emails.
#[derive(Clone)]
pub struct InvitationMailer {
    email_service: Arc<dyn EmailService>,
    frontend_url: String,
}

impl InvitationMailer {
    /// Creates a mailer linking to `frontend_url`.
    #[must_use]
    pub fn new(email_service: Arc<dyn EmailService>, frontend_url: impl Into<String>) -> Self {
        Self {
            email_service,
            frontend_url: frontend_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the link a recipient follows to accept the invitation.
    #[must_use]
    pub fn accept_url(&self, raw_token: &str) -> String {
        format!("{}/accept-invitation/{raw_token}", self.frontend_url)
    }

    /// Renders the subject and text body for a notice.
    #[must_use]
    pub fn render(&self, notice: &InvitationNotice) -> (String, String) {
        let accept_url = self.accept_url(&notice.token);
        let expires_at = notice.expires_at.format("%Y-%m-%d %H:%M UTC");

        let (subject, intro) = match notice.kind {
            NoticeKind::Invited => (
                "You have been invited to the property planner",
                "An account has been created for you on the property planner.",
            ),
            NoticeKind::Resent => (
                "Your property planner invitation",
                "Here is a fresh invitation link for your property planner account. \
                 Earlier links no longer work.",
            ),
        };

        let role_lines = role_lines(&notice.role);
        let text_body = format!(
            "{intro}\n\n\
             {role_lines}\n\
             Click the link below to accept the invitation and activate your account:\n\
             {accept_url}\n\n\
             This link expires in {INVITATION_VALIDITY_DAYS} days ({expires_at})."
        );

        (subject.to_owned(), text_body)
    }

    /// Sends the email for one notice.
    pub async fn deliver(&self, notice: &InvitationNotice) -> AppResult<()> {
        let (subject, text_body) = self.render(notice);
        self.email_service
            .send_email(&notice.email, &subject, &text_body, None)
            .await
    }
}

fn role_lines(role: &InvitationRoleInfo) -> String {
    let mut lines = format!("Role: {}\n", role.role_label);
    if let Some(property_name) = &role.property_name {
        lines.push_str(&format!("Property: {property_name}\n"));
    }
    if let Some(group_name) = &role.property_group_name {
        lines.push_str(&format!("Property group: {group_name}\n"));
    }
    lines
}
