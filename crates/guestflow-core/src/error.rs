//! Error types for the GuestFlow system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuestflowError {
    #[error("Not authenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Absent and cross-tenant entities are reported identically.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict on {entity}: {reason}")]
    Conflict { entity: String, reason: String },

    #[error("Invalid reference: {entity} {id} does not resolve within the tenant")]
    InvalidReference { entity: String, id: String },

    #[error("Invalid transition: cannot {action} a booking in status {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Table {table_id} is already reserved for an overlapping interval")]
    TableConflict { table_id: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Transient store failure; the caller may retry with backoff.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuestflowError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type GuestflowResult<T> = Result<T, GuestflowError>;
