pub use super::feed_version_imports::Entity as FeedVersionImports;
pub use super::feed_versions::Entity as FeedVersions;
pub use super::feeds::Entity as Feeds;
pub use super::import_jobs::Entity as ImportJobs;
pub use super::schedule_stop_pairs::Entity as ScheduleStopPairs;
