use tracing::info;

use planner_core::AppResult;
use planner_domain::{Principal, PrincipalId};

use super::{UpdateProfileInput, UserAdministrationService, normalize_name};
use crate::access_ports::DirectoryStore;
use crate::permission_evaluator::load_actor;

impl UserAdministrationService {
    /// Updates the actor's own name fields.
    ///
    /// Only the name fields change; the role and email stay untouched.
    pub async fn update_own_profile(
        &self,
        actor_id: PrincipalId,
        input: UpdateProfileInput,
    ) -> AppResult<Principal> {
        let mut transaction = self.store.begin().await?;
        let mut actor = load_actor(&mut *transaction, actor_id).await?;

        if let Some(first_name) = input.first_name {
            actor.first_name = normalize_name(Some(first_name));
        }
        if let Some(last_name) = input.last_name {
            actor.last_name = normalize_name(Some(last_name));
        }

        transaction.update_principal(&actor).await?;
        transaction.commit().await?;

        info!(principal_id = %actor.id, "profile updated");
        Ok(actor)
    }
}
