//! Unified error handling for the plugin host and its migration engine.
//!
//! Every fallible operation in the workspace returns [`AppResult`], so the
//! CLI can report failures uniformly and exit non-zero.

use sea_orm::DbErr;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Discovery
    #[error("'{0}' directory not found")]
    PathNotFound(String),

    #[error("Migration {0} is not registered")]
    UnresolvedMigration(String),

    #[error("Migration {0} is defined more than once")]
    DuplicateMigration(String),

    // Execution
    #[error("Migration {identifier} failed: {source}")]
    Migration {
        identifier: String,
        #[source]
        source: DbErr,
    },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    // Validation
    #[error("{0}")]
    Validation(String),

    // External
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get a stable error code for logs and exit reporting
    pub fn code(&self) -> &'static str {
        match self {
            AppError::PathNotFound(_) => "PATH_NOT_FOUND",
            AppError::UnresolvedMigration(_) => "UNRESOLVED_MIGRATION",
            AppError::DuplicateMigration(_) => "DUPLICATE_MIGRATION",
            AppError::Migration { .. } => "MIGRATION_FAILED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the failure happened before any transaction was opened
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            AppError::PathNotFound(_)
                | AppError::UnresolvedMigration(_)
                | AppError::DuplicateMigration(_)
        )
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn path_not_found(path: impl Into<String>) -> Self {
        AppError::PathNotFound(path.into())
    }

    pub fn migration(identifier: impl Into<String>, source: DbErr) -> Self {
        AppError::Migration {
            identifier: identifier.into(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}
