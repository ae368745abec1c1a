//! GuestFlow Auth: password authentication, session/renewal JWTs and
//! the tenant-scoped authorization guard.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use guard::{CapabilityContext, authorize};
pub use service::{AuthenticateInput, SessionService, TokenPair};
pub use token::{SessionClaims, TokenKind};
