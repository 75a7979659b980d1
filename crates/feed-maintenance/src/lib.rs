//! Feed-version maintenance for a transit data registry.
//!
//! Two periodic operations live here:
//! - [`maintenance::FeedVersionScheduler`] picks the next feed version to import
//!   for every feed and hands a bounded, fairness-ordered batch to a
//!   [`job_scheduling::JobDispatcher`].
//! - [`maintenance::ExtensionEngine`] widens the service window of schedule data
//!   belonging to feed versions that are about to run out of coverage.
//!
//! Both read the registry through the [`catalog::FeedCatalog`] trait so they can
//! run against the SeaORM-backed store or an in-memory catalog.

pub mod catalog;
pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod job_scheduling;
pub mod maintenance;
pub mod models;
pub mod utils;
