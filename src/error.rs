//! Errors surfaced by the store.
//!
//! Constraint violations are mapped to dedicated variants so callers can react
//! to them without string matching. Everything the engine reports that is not
//! a constraint violation is treated as the storage being unavailable.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A model named '{0}' already exists")]
    DuplicateName(String),

    #[error("A result for prompt {prompt_id} and model {model_id} already exists")]
    DuplicateResult { prompt_id: i32, model_id: i32 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the failure is a constraint violation the caller caused, as
    /// opposed to the storage medium failing.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_) | Self::DuplicateResult { .. } | Self::NotFound { .. }
        )
    }
}

/// Constraint violations reported by the engine, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

pub(crate) fn violation(err: &DbErr) -> Option<Violation> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Some(Violation::Unique),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => Some(Violation::ForeignKey),
        _ => None,
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageUnavailable(format!("Corrupt stored value: {err}"))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
