//! Import job dispatch
//!
//! The scheduler hands each selected `(feed, version, level)` triple to a
//! [`JobDispatcher`]. Two dispatchers are provided:
//! - `ImportJobOutbox`: persists `pending` rows for an external import worker
//! - `JobQueue`: in-process queue with key deduplication

pub mod dispatcher;
pub mod job_queue;
pub mod outbox;
pub mod types;

pub use dispatcher::JobDispatcher;
pub use job_queue::JobQueue;
pub use outbox::ImportJobOutbox;
pub use types::*;
