//! SeaORM entity definitions for the feed registry tables

pub mod prelude;

pub mod feed_version_imports;
pub mod feed_versions;
pub mod feeds;
pub mod import_jobs;
pub mod schedule_stop_pairs;
