use async_trait::async_trait;

use crate::modules::notification::domain::{ReportedError, RunStatus};
use crate::shared::errors::AppResult;

/// Port (interface) for wherever upload status is shown to the uploader
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, run_key: &str, status: RunStatus) -> AppResult<()>;

    async fn set_error_status(&self, run_key: &str, errors: Vec<ReportedError>) -> AppResult<()>;
}
