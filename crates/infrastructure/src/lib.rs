//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod channel_invitation_notifier;
mod console_email_service;
mod in_memory_access_store;
mod postgres_access_store;
mod postgres_invitation_outbox;
mod smtp_email_service;

pub use channel_invitation_notifier::{ChannelInvitationNotifier, deliver_invitations};
pub use console_email_service::ConsoleEmailService;
pub use in_memory_access_store::{InMemoryAccessStore, InMemoryAccessTransaction};
pub use postgres_access_store::{PostgresAccessStore, PostgresAccessTransaction};
pub use postgres_invitation_outbox::{OutboxMessage, PostgresInvitationOutbox};
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
