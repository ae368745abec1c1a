//! GuestFlow Server: the operation facade over the session service,
//! authorization guard and repositories, plus process configuration and
//! seeding.

pub mod app;
pub mod config;
pub mod error;
pub mod seed;

pub use app::{AppSettings, GuestflowApp};
pub use config::ServerConfig;
pub use error::ServerError;
