use async_trait::async_trait;
use dashmap::DashMap;

use crate::modules::notification::application::ports::StatusSink;
use crate::modules::notification::domain::{ReportedError, RunStatus};
use crate::shared::errors::AppResult;

/// Status sink that keeps every update in memory, keyed by run
#[derive(Debug, Default)]
pub struct InMemoryStatusSink {
    statuses: DashMap<String, Vec<RunStatus>>,
    errors: DashMap<String, Vec<ReportedError>>,
}

impl InMemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status recorded for the run
    pub fn status(&self, run_key: &str) -> Option<RunStatus> {
        self.statuses
            .get(run_key)
            .and_then(|history| history.last().copied())
    }

    /// Every status the run went through, oldest first
    pub fn history(&self, run_key: &str) -> Vec<RunStatus> {
        self.statuses
            .get(run_key)
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self, run_key: &str) -> Vec<ReportedError> {
        self.errors
            .get(run_key)
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatusSink for InMemoryStatusSink {
    async fn set_status(&self, run_key: &str, status: RunStatus) -> AppResult<()> {
        self.statuses
            .entry(run_key.to_string())
            .or_default()
            .push(status);
        Ok(())
    }

    async fn set_error_status(&self, run_key: &str, errors: Vec<ReportedError>) -> AppResult<()> {
        self.errors.insert(run_key.to_string(), errors);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keeps_status_history_per_run() {
        let sink = InMemoryStatusSink::new();
        sink.set_status("a", RunStatus::Working).await.unwrap();
        sink.set_status("a", RunStatus::Failed).await.unwrap();
        sink.set_status("b", RunStatus::Succeeded).await.unwrap();

        assert_eq!(sink.history("a"), vec![RunStatus::Working, RunStatus::Failed]);
        assert_eq!(sink.status("b"), Some(RunStatus::Succeeded));
        assert_eq!(sink.status("c"), None);
        assert!(sink.errors("a").is_empty());
    }
}
