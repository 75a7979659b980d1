//! SeaORM repository implementations
//!
//! This module provides repository implementations using SeaORM that work across
//! SQLite, PostgreSQL, and MySQL databases.

pub mod feed;
pub mod feed_version;
pub mod feed_version_import;
pub mod schedule_stop_pair;

// Re-export for convenience
pub use feed::FeedSeaOrmRepository;
pub use feed_version::FeedVersionSeaOrmRepository;
pub use feed_version_import::FeedVersionImportSeaOrmRepository;
pub use schedule_stop_pair::ScheduleStopPairSeaOrmRepository;
