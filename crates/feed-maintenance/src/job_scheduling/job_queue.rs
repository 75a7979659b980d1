//! In-process import job queue with deduplication

use super::dispatcher::JobDispatcher;
use super::types::{ImportJob, JobSchedulingError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Thread-safe FIFO job queue with deduplication
#[derive(Debug)]
pub struct JobQueue {
    /// Pending jobs in dispatch order
    pending: Arc<RwLock<VecDeque<ImportJob>>>,
    /// Keys of jobs handed to a worker and not yet completed
    running: Arc<RwLock<HashSet<String>>>,
    /// Active job keys for deduplication (both pending and running)
    job_keys: Arc<RwLock<HashSet<String>>>,
}

impl JobQueue {
    /// Create a new empty job queue
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(VecDeque::new())),
            running: Arc::new(RwLock::new(HashSet::new())),
            job_keys: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Enqueue a job if it doesn't already exist
    /// Returns Ok(true) if job was enqueued, Ok(false) if duplicate was skipped
    pub async fn push(&self, job: ImportJob) -> Result<bool, JobSchedulingError> {
        let job_key = job.job_key();
        let mut job_keys = self.job_keys.write().await;

        if job_keys.contains(&job_key) {
            debug!("Skipping duplicate job for key: {}", job_key);
            return Ok(false);
        }

        job_keys.insert(job_key.clone());
        drop(job_keys);

        self.pending.write().await.push_back(job.clone());

        info!(
            "Enqueued import job {} (level {})",
            job_key, job.import_level
        );

        Ok(true)
    }

    /// Take the oldest pending job and mark it as running
    pub async fn take_next(&self) -> Option<ImportJob> {
        let job = self.pending.write().await.pop_front()?;
        self.running.write().await.insert(job.job_key());
        debug!("Marked job {} as running", job.job_key());
        Some(job)
    }

    /// Mark a job as completed and remove from tracking
    pub async fn mark_completed(&self, job_key: &str) {
        if self.running.write().await.remove(job_key) {
            self.job_keys.write().await.remove(job_key);
            debug!("Job {} completed and removed from tracking", job_key);
        } else {
            warn!("Attempted to mark unknown job {} as completed", job_key);
        }
    }

    /// Snapshot of pending jobs in dispatch order
    pub async fn pending(&self) -> Vec<ImportJob> {
        self.pending.read().await.iter().cloned().collect()
    }

    /// Get the number of currently running jobs
    pub async fn running_count(&self) -> usize {
        self.running.read().await.len()
    }

    /// Get the number of pending jobs
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Check if a specific job key is already tracked (pending or running)
    pub async fn contains_job_key(&self, job_key: &str) -> bool {
        self.job_keys.read().await.contains(job_key)
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobDispatcher for JobQueue {
    async fn enqueue(&self, job: ImportJob) -> Result<(), JobSchedulingError> {
        let key = job.job_key();
        if self.push(job).await? {
            Ok(())
        } else {
            Err(JobSchedulingError::DuplicateJob { key })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_queue_enqueue_and_deduplication() {
        let queue = JobQueue::new();

        assert!(queue.push(ImportJob::new("f-a", "sha-1", 2)).await.unwrap());
        // Same feed and version at another level is still the same import
        assert!(!queue.push(ImportJob::new("f-a", "sha-1", 4)).await.unwrap());
        assert!(queue.push(ImportJob::new("f-a", "sha-2", 2)).await.unwrap());

        assert_eq!(queue.pending_count().await, 2);
    }

    #[tokio::test]
    async fn test_dispatcher_reports_duplicates() {
        let queue = JobQueue::new();
        queue.enqueue(ImportJob::new("f-a", "sha-1", 2)).await.unwrap();

        let err = queue
            .enqueue(ImportJob::new("f-a", "sha-1", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, JobSchedulingError::DuplicateJob { key } if key == "f-a:sha-1"));
    }

    #[tokio::test]
    async fn test_job_queue_preserves_dispatch_order() {
        let queue = JobQueue::new();
        for feed in ["f-c", "f-a", "f-b"] {
            queue.push(ImportJob::new(feed, "sha", 2)).await.unwrap();
        }

        let order: Vec<String> = queue
            .pending()
            .await
            .into_iter()
            .map(|job| job.feed_onestop_id)
            .collect();
        assert_eq!(order, vec!["f-c", "f-a", "f-b"]);
    }

    #[tokio::test]
    async fn test_job_queue_running_lifecycle() {
        let queue = JobQueue::new();
        let job = ImportJob::new("f-a", "sha-1", 2);
        let job_key = job.job_key();

        queue.push(job).await.unwrap();
        let taken = queue.take_next().await.unwrap();
        assert_eq!(taken.job_key(), job_key);
        assert_eq!(queue.running_count().await, 1);
        assert_eq!(queue.pending_count().await, 0);

        // Job key should still be tracked (prevents duplicates)
        assert!(queue.contains_job_key(&job_key).await);
        assert!(!queue.push(ImportJob::new("f-a", "sha-1", 2)).await.unwrap());

        queue.mark_completed(&job_key).await;
        assert_eq!(queue.running_count().await, 0);
        assert!(!queue.contains_job_key(&job_key).await);
        assert!(queue.take_next().await.is_none());
    }
}
