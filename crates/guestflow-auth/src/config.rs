//! Authentication configuration.

/// Configuration for the session service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Session token lifetime in seconds (default: 1800 = 30 minutes).
    pub session_token_lifetime_secs: u64,
    /// Renewal token lifetime in seconds (default: 604_800 = 7 days).
    pub renewal_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            session_token_lifetime_secs: 1800,
            renewal_token_lifetime_secs: 604_800,
            jwt_issuer: "guestflow".into(),
            pepper: None,
        }
    }
}
