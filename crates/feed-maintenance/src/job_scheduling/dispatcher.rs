use async_trait::async_trait;

use super::types::{ImportJob, JobSchedulingError};

/// Accepts import jobs for asynchronous execution
///
/// Dispatch is fire-and-forget: success means the job was accepted, not that
/// the import ran.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn enqueue(&self, job: ImportJob) -> Result<(), JobSchedulingError>;
}
