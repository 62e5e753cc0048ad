use async_trait::async_trait;

use crate::modules::registry::application::ports::SystemIdentityProvider;
use crate::modules::registry::domain::SystemIdentity;
use crate::shared::config::PipelineConfig;
use crate::shared::errors::{AppError, AppResult};

/// System identity taken from pipeline configuration
#[derive(Debug, Clone)]
pub struct ConfiguredIdentity {
    identity: SystemIdentity,
}

impl ConfiguredIdentity {
    pub fn new(identity: SystemIdentity) -> Self {
        Self { identity }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(SystemIdentity {
            user_id: config.system_user_id,
            organisation_id: config.system_organisation_id,
        })
    }
}

#[async_trait]
impl SystemIdentityProvider for ConfiguredIdentity {
    async fn system_identity(&self) -> AppResult<SystemIdentity> {
        if self.identity.user_id.is_nil() || self.identity.organisation_id.is_nil() {
            return Err(AppError::Configuration(
                "System user and organisation ids are not configured".to_string(),
            ));
        }
        Ok(self.identity)
    }
}
