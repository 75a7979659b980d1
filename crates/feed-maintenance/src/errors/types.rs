//! Error type definitions for feed maintenance

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Data access layer errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Tag map serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// A concurrent writer changed the row between read and write
    #[error("Concurrent modification of {table} row {id}")]
    Conflict { table: String, id: Uuid },

    /// Generic backend failure for catalogs not backed by SeaORM
    #[error("Catalog unavailable: {message}")]
    Unavailable { message: String },
}

impl RepositoryError {
    /// Create a record-not-found error
    pub fn not_found<T: Into<String>, F: Into<String>, V: Into<String>>(
        table: T,
        field: F,
        value: V,
    ) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a conflict error for a row that changed underneath us
    pub fn conflict<T: Into<String>>(table: T, id: Uuid) -> Self {
        Self::Conflict {
            table: table.into(),
            id,
        }
    }
}

/// Run-level errors of the scheduler and extension engine
#[derive(Error, Debug)]
pub enum MaintenanceError {
    /// The feed catalog could not be read; the run was aborted
    #[error("Feed catalog error: {0}")]
    Catalog(#[from] RepositoryError),

    /// Extending a single feed version failed
    #[error("Failed to extend feed version {sha1}: {source}")]
    Extension {
        sha1: String,
        #[source]
        source: RepositoryError,
    },

    /// Date arithmetic left the representable calendar range
    #[error("Date out of range: {date} {operation}")]
    DateOutOfRange { date: NaiveDate, operation: String },
}

impl MaintenanceError {
    /// Create a date-out-of-range error
    pub fn date_out_of_range<S: Into<String>>(date: NaiveDate, operation: S) -> Self {
        Self::DateOutOfRange {
            date,
            operation: operation.into(),
        }
    }
}
