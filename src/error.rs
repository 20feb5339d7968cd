//! Error types shared by the sync engine and its collaborators

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream unavailable, non-success status or malformed body
    #[error("Catalog transport error: {0}")]
    Transport(String),

    /// Upstream answered 404 for a detail lookup
    #[error("Protocol not found upstream: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Store(#[from] sea_orm::DbErr),

    #[error("Invalid {field} value {value} for {protocol_id}")]
    InvalidValue {
        protocol_id: String,
        field: &'static str,
        value: f64,
    },

    /// Persisted ledger document could not be decoded
    #[error("Corrupt checkpoint ledger: {0}")]
    Ledger(String),
}

impl SyncError {
    /// Only a corrupt ledger needs operator attention; everything else
    /// clears on its own once upstream or the database recovers.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::Ledger(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}
