use serde::{Deserialize, Serialize};

/// Aggregate state of one upload run as shown to the uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Working,
    Succeeded,
    PartialFailure,
    Failed,
}

impl RunStatus {
    /// Aggregate verdict from row counts. An empty file succeeds.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => RunStatus::Succeeded,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::PartialFailure,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Working)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunStatus::Working => "Working",
            RunStatus::Succeeded => "Succeeded",
            RunStatus::PartialFailure => "PartialFailure",
            RunStatus::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}

/// One itemised error shown to the uploader; file level errors have no row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub row_number: Option<usize>,
    pub field: Option<String>,
    pub message: String,
}

impl ReportedError {
    pub fn file_level(message: impl Into<String>) -> Self {
        Self {
            row_number: None,
            field: None,
            message: message.into(),
        }
    }
}

/// What a finished run reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_key: String,
    pub status: RunStatus,
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<ReportedError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_status() {
        assert_eq!(RunStatus::from_counts(0, 0), RunStatus::Succeeded);
        assert_eq!(RunStatus::from_counts(3, 0), RunStatus::Succeeded);
        assert_eq!(RunStatus::from_counts(2, 1), RunStatus::PartialFailure);
        assert_eq!(RunStatus::from_counts(0, 4), RunStatus::Failed);
        assert!(!RunStatus::Working.is_terminal());
    }
}
