//! Console email service for development. Writes emails to the tracing output.

use async_trait::async_trait;
use tracing::info;

use planner_application::EmailService;
use planner_core::AppResult;

/// Development email service that logs instead of sending.
#[derive(Debug, Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(
            to,
            subject,
            "email (console)\n{text_body}"
        );

        Ok(())
    }
}
