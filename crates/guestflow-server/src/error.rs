//! Startup error type for the server process.

use guestflow_core::error::GuestflowError;
use guestflow_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Operation(#[from] GuestflowError),
}
