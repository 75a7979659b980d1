//! Periodic maintenance runs over the feed registry

pub mod extension;
pub mod scheduler;

pub use extension::{ExtensionEngine, ExtensionSummary};
pub use scheduler::{DispatchReport, FeedVersionScheduler};
