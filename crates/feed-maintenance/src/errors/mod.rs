//! Centralized error handling for feed maintenance
//!
//! # Error Categories
//!
//! - **Repository Errors**: SeaORM failures, tag (de)serialization, conflicts
//! - **Job Scheduling Errors**: dispatch failures (see [`crate::job_scheduling`])
//! - **Maintenance Errors**: run-level failures of the scheduler or extension engine
//!
//! # Usage
//!
//! ```rust
//! use feed_maintenance::errors::{RepositoryError, RepositoryResult};
//!
//! fn lookup() -> RepositoryResult<u64> {
//!     Err(RepositoryError::not_found("feed_versions", "sha1", "abc"))
//! }
//! assert!(lookup().is_err());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for maintenance run Results
pub type MaintenanceResult<T> = Result<T, MaintenanceError>;
