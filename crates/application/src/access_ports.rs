mod capabilities;
mod directory;
mod invitations;
mod notifications;
mod transaction;

pub use capabilities::CapabilityStore;
pub use directory::DirectoryStore;
pub use invitations::InvitationTokenStore;
pub use notifications::{EmailService, InvitationNotifier};
pub use transaction::{AccessStore, AccessTransaction};
