use async_trait::async_trait;

use planner_core::AppResult;

use super::{CapabilityStore, DirectoryStore, InvitationTokenStore};

/// Unit of work spanning every access store.
///
/// Dropping a transaction without calling [`AccessTransaction::commit`] discards its writes.
#[async_trait]
pub trait AccessTransaction: DirectoryStore + InvitationTokenStore + CapabilityStore {
    /// Publishes every write made through this transaction.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Entry point to the access stores.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Opens a serializable unit of work.
    async fn begin(&self) -> AppResult<Box<dyn AccessTransaction>>;
}
