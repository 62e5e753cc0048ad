use async_trait::async_trait;

use crate::modules::registry::domain::SystemIdentity;
use crate::shared::errors::AppResult;

/// Port (interface) resolving the account used for registry writes
#[async_trait]
pub trait SystemIdentityProvider: Send + Sync {
    async fn system_identity(&self) -> AppResult<SystemIdentity>;
}
