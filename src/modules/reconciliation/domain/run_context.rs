use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity and control handle for one upload run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Key the status sink files this run under
    pub run_key: String,
    pub file_name: String,
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            run_key: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_run_key(mut self, run_key: impl Into<String>) -> Self {
        self.run_key = run_key.into();
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
