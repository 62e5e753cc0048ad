use super::status::{ReportedError, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications raised over the life of one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum UploadEvent {
    AntivirusCheck {
        run_key: String,
        file_name: String,
        clean: bool,
        checked_at: DateTime<Utc>,
    },
    BulkUploadComplete {
        run_key: String,
        file_name: String,
        status: RunStatus,
        errors: Vec<ReportedError>,
        completed_at: DateTime<Utc>,
    },
    BulkUploadFailed {
        run_key: String,
        file_name: String,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl UploadEvent {
    pub fn antivirus_check(run_key: &str, file_name: &str, clean: bool) -> Self {
        Self::AntivirusCheck {
            run_key: run_key.to_string(),
            file_name: file_name.to_string(),
            clean,
            checked_at: Utc::now(),
        }
    }

    pub fn bulk_upload_complete(
        run_key: &str,
        file_name: &str,
        status: RunStatus,
        errors: Vec<ReportedError>,
    ) -> Self {
        Self::BulkUploadComplete {
            run_key: run_key.to_string(),
            file_name: file_name.to_string(),
            status,
            errors,
            completed_at: Utc::now(),
        }
    }

    pub fn bulk_upload_failed(run_key: &str, file_name: &str, reason: impl Into<String>) -> Self {
        Self::BulkUploadFailed {
            run_key: run_key.to_string(),
            file_name: file_name.to_string(),
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }

    pub fn run_key(&self) -> &str {
        match self {
            Self::AntivirusCheck { run_key, .. }
            | Self::BulkUploadComplete { run_key, .. }
            | Self::BulkUploadFailed { run_key, .. } => run_key,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AntivirusCheck { .. } => "antivirus_check",
            Self::BulkUploadComplete { .. } => "bulk_upload_complete",
            Self::BulkUploadFailed { .. } => "bulk_upload_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = UploadEvent::bulk_upload_failed("run-1", "upload.csv", "Missing column");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event_type"], "bulk_upload_failed");
        assert_eq!(value["reason"], "Missing column");
        assert_eq!(event.run_key(), "run-1");
        assert_eq!(event.event_type(), "bulk_upload_failed");
    }
}
