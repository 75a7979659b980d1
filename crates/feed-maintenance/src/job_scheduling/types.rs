//! Job scheduling type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to import one feed version at a given level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    pub feed_onestop_id: String,
    pub feed_version_sha1: String,
    pub import_level: i32,
}

impl ImportJob {
    pub fn new(
        feed_onestop_id: impl Into<String>,
        feed_version_sha1: impl Into<String>,
        import_level: i32,
    ) -> Self {
        Self {
            feed_onestop_id: feed_onestop_id.into(),
            feed_version_sha1: feed_version_sha1.into(),
            import_level,
        }
    }

    /// Generate a unique key for deduplication
    /// Jobs with the same key will be deduplicated
    pub fn job_key(&self) -> String {
        format!("{}:{}", self.feed_onestop_id, self.feed_version_sha1)
    }
}

/// Lifecycle state of a persisted import job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ImportJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportJobStatus::Pending => "pending",
            ImportJobStatus::Running => "running",
            ImportJobStatus::Completed => "completed",
            ImportJobStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ImportJobStatus {
    type Err = JobSchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportJobStatus::Pending),
            "running" => Ok(ImportJobStatus::Running),
            "completed" => Ok(ImportJobStatus::Completed),
            "failed" => Ok(ImportJobStatus::Failed),
            other => Err(JobSchedulingError::InvalidJob {
                reason: format!("unknown import job status '{other}'"),
            }),
        }
    }
}

/// An import job as stored in the outbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedImportJob {
    pub id: Uuid,
    pub job: ImportJob,
    pub status: ImportJobStatus,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur in the job scheduling system
#[derive(Debug, thiserror::Error)]
pub enum JobSchedulingError {
    /// Job already exists in the queue
    #[error("Job with key '{key}' already exists in queue")]
    DuplicateJob { key: String },

    /// Invalid job data
    #[error("Invalid job: {reason}")]
    InvalidJob { reason: String },

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] sea_orm::DbErr),
}
