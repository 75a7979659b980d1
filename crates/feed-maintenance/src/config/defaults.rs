//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./feed-maintenance.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Scheduling defaults
pub const DEFAULT_IMPORT_LEVEL: i32 = 2;

// Extension defaults
pub const DEFAULT_EXTEND_FROM_MONTHS: u32 = 1;
pub const DEFAULT_EXTEND_TO_YEARS: u32 = 1;
pub const DEFAULT_EXPIRING_WITHIN_DAYS: u32 = 7;

// Tag keys
pub const MANUAL_IMPORT_TAG: &str = "manual_import";
pub const EXTEND_FROM_DATE_TAG: &str = "extend_from_date";
pub const EXTEND_TO_DATE_TAG: &str = "extend_to_date";
