use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to load billing data from {locator}: {reason}")]
    LoadError { locator: String, reason: String },

    #[error("No billing data available for {locator}")]
    EmptyResult { locator: String },

    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid source template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DashboardError {
    /// True for a valid response that carried no usable rows. The caller shows
    /// an informational "no data" state instead of a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, DashboardError::EmptyResult { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
