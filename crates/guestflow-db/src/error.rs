//! Database-specific error types and conversions.

use guestflow_core::error::GuestflowError;

/// Prefix of every `THROW` raised by repository transactions.
pub(crate) const ABORT_MARKER: &str = "gf:";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Timed out connecting to SurrealDB after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Malformed stored record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {reason}")]
    Duplicate { entity: String, reason: String },

    #[error("Reference to {entity} {id} does not resolve")]
    InvalidReference { entity: String, id: String },

    #[error("Status {from} does not allow {action}")]
    InvalidTransition { from: String, action: String },

    #[error("Table {table_id} already reserved")]
    TableConflict { table_id: String },
}

impl From<DbError> for GuestflowError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GuestflowError::NotFound { entity, id },
            DbError::Duplicate { entity, reason } => GuestflowError::Conflict { entity, reason },
            DbError::InvalidReference { entity, id } => {
                GuestflowError::InvalidReference { entity, id }
            }
            DbError::InvalidTransition { from, action } => {
                GuestflowError::InvalidTransition { from, action }
            }
            DbError::TableConflict { table_id } => GuestflowError::TableConflict { table_id },
            // Engine and transport failures (including aborted
            // transactions on write conflicts) are retryable.
            DbError::Surreal(e) => GuestflowError::Unavailable(e.to_string()),
            timeout @ DbError::ConnectTimeout(_) => GuestflowError::Unavailable(timeout.to_string()),
            other @ (DbError::Migration(_) | DbError::Decode(_)) => {
                GuestflowError::Internal(other.to_string())
            }
        }
    }
}
