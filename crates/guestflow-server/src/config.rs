//! Process configuration.
//!
//! Every option can be given on the command line or through a
//! `GUESTFLOW_*` environment variable; a `.env` file in the working
//! directory is loaded first.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GUESTFLOW_DB_URL` | 127.0.0.1:8000 | SurrealDB WebSocket address |
//! | `GUESTFLOW_DB_NAMESPACE` | guestflow | SurrealDB namespace |
//! | `GUESTFLOW_DB_DATABASE` | main | SurrealDB database |
//! | `GUESTFLOW_DB_USERNAME` | root | Root user |
//! | `GUESTFLOW_DB_PASSWORD` | root | Root password |
//! | `GUESTFLOW_STORE_TIMEOUT_SECS` | 5 | Bound on a single store interaction |
//! | `GUESTFLOW_JWT_PRIVATE_KEY` | (none) | Path to the Ed25519 signing key (PEM) |
//! | `GUESTFLOW_JWT_PUBLIC_KEY` | (none) | Path to the Ed25519 verification key (PEM) |
//! | `GUESTFLOW_JWT_ISSUER` | guestflow | `iss` claim |
//! | `GUESTFLOW_SESSION_TTL_SECS` | 1800 | Session token lifetime |
//! | `GUESTFLOW_RENEWAL_TTL_SECS` | 604800 | Renewal token lifetime |
//! | `GUESTFLOW_PASSWORD_PEPPER` | (none) | Optional password pepper |
//! | `GUESTFLOW_DEFAULT_TIMEZONE` | Asia/Dushanbe | Timezone for new tenants |
//! | `GUESTFLOW_SEED_OPERATOR_EMAIL` / `_PASSWORD` | (none) | Platform operator to provision |
//! | `GUESTFLOW_SEED_TENANT_NAME`, `GUESTFLOW_SEED_OWNER_EMAIL` / `_PASSWORD` | (none) | Tenant and owner to provision |

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use guestflow_auth::AuthConfig;
use guestflow_core::models::tenant::{DEFAULT_TIMEZONE, validate_timezone};
use guestflow_db::DbConfig;

use crate::error::ServerError;
use crate::seed::TenantSeed;

#[derive(Debug, Clone, Parser)]
#[command(name = "guestflow-server")]
#[command(about = "Multi-tenant restaurant booking service")]
pub struct ServerConfig {
    /// SurrealDB WebSocket address.
    #[arg(long, env = "GUESTFLOW_DB_URL", default_value = "127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "GUESTFLOW_DB_NAMESPACE", default_value = "guestflow")]
    pub db_namespace: String,

    #[arg(long, env = "GUESTFLOW_DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "GUESTFLOW_DB_USERNAME", default_value = "root")]
    pub db_username: String,

    #[arg(long, env = "GUESTFLOW_DB_PASSWORD", default_value = "root")]
    pub db_password: String,

    /// Upper bound on a single store interaction, in seconds.
    #[arg(long, env = "GUESTFLOW_STORE_TIMEOUT_SECS", default_value = "5")]
    pub store_timeout_secs: u64,

    /// Path to the PEM-encoded Ed25519 private key.
    #[arg(long, env = "GUESTFLOW_JWT_PRIVATE_KEY")]
    pub jwt_private_key: PathBuf,

    /// Path to the PEM-encoded Ed25519 public key.
    #[arg(long, env = "GUESTFLOW_JWT_PUBLIC_KEY")]
    pub jwt_public_key: PathBuf,

    #[arg(long, env = "GUESTFLOW_JWT_ISSUER", default_value = "guestflow")]
    pub jwt_issuer: String,

    #[arg(long, env = "GUESTFLOW_SESSION_TTL_SECS", default_value = "1800")]
    pub session_ttl_secs: u64,

    #[arg(long, env = "GUESTFLOW_RENEWAL_TTL_SECS", default_value = "604800")]
    pub renewal_ttl_secs: u64,

    #[arg(long, env = "GUESTFLOW_PASSWORD_PEPPER")]
    pub password_pepper: Option<String>,

    /// Timezone given to tenants created without one.
    #[arg(long, env = "GUESTFLOW_DEFAULT_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub default_timezone: String,

    /// Provision the platform operator with this email on startup.
    #[arg(long, env = "GUESTFLOW_SEED_OPERATOR_EMAIL")]
    pub seed_operator_email: Option<String>,

    #[arg(long, env = "GUESTFLOW_SEED_OPERATOR_PASSWORD")]
    pub seed_operator_password: Option<String>,

    /// Provision a tenant with this name and an owner on startup.
    #[arg(long, env = "GUESTFLOW_SEED_TENANT_NAME")]
    pub seed_tenant_name: Option<String>,

    #[arg(long, env = "GUESTFLOW_SEED_OWNER_EMAIL")]
    pub seed_owner_email: Option<String>,

    #[arg(long, env = "GUESTFLOW_SEED_OWNER_PASSWORD")]
    pub seed_owner_password: Option<String>,
}

impl ServerConfig {
    /// Load `.env` (if present) and parse arguments and environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
            timeout: self.store_timeout(),
        }
    }

    /// Read the signing keys and build the session configuration.
    pub fn auth_config(&self) -> Result<AuthConfig, ServerError> {
        Ok(AuthConfig {
            jwt_private_key_pem: read_key(&self.jwt_private_key)?,
            jwt_public_key_pem: read_key(&self.jwt_public_key)?,
            session_token_lifetime_secs: self.session_ttl_secs,
            renewal_token_lifetime_secs: self.renewal_ttl_secs,
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.password_pepper.clone(),
        })
    }

    /// Reject combinations that parse but cannot work.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.store_timeout_secs == 0 {
            return Err(ServerError::Config("store timeout cannot be 0".into()));
        }
        if self.session_ttl_secs == 0 || self.renewal_ttl_secs == 0 {
            return Err(ServerError::Config("token lifetimes cannot be 0".into()));
        }
        validate_timezone(&self.default_timezone)
            .map_err(|e| ServerError::Config(format!("default timezone: {e}")))?;
        if self.seed_operator_email.is_some() != self.seed_operator_password.is_some() {
            return Err(ServerError::Config(
                "seed operator email and password must be given together".into(),
            ));
        }
        let tenant_seed = [
            self.seed_tenant_name.is_some(),
            self.seed_owner_email.is_some(),
            self.seed_owner_password.is_some(),
        ];
        if tenant_seed.iter().any(|set| *set) && !tenant_seed.iter().all(|set| *set) {
            return Err(ServerError::Config(
                "seed tenant name, owner email and owner password must be given together".into(),
            ));
        }
        Ok(())
    }

    /// Tenant to provision on startup, when fully configured.
    pub fn tenant_seed(&self) -> Option<TenantSeed> {
        Some(TenantSeed {
            name: self.seed_tenant_name.clone()?,
            timezone: self.default_timezone.clone(),
            owner_email: self.seed_owner_email.clone()?,
            owner_password: self.seed_owner_password.clone()?,
        })
    }
}

fn read_key(path: &PathBuf) -> Result<String, ServerError> {
    std::fs::read_to_string(path)
        .map_err(|e| ServerError::Config(format!("cannot read key {}: {e}", path.display())))
}
