//! Session and renewal JWT issuance and verification.
//!
//! Both kinds are EdDSA (Ed25519) JWTs signed with the same key and told
//! apart by the `kind` claim. Renewal is stateless: nothing is persisted
//! when a token is issued.

use chrono::Utc;
use guestflow_core::models::staff::{StaffRole, StaffUser};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived credential presented on every operation.
    Session,
    /// Long-lived credential accepted only by `renew`.
    Renewal,
}

impl TokenKind {
    fn lifetime_secs(self, config: &AuthConfig) -> u64 {
        match self {
            TokenKind::Session => config.session_token_lifetime_secs,
            TokenKind::Renewal => config.renewal_token_lifetime_secs,
        }
    }
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: staff user ID (UUID string).
    pub sub: String,
    /// Tenant ID; absent for the platform operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub role: StaffRole,
    pub kind: TokenKind,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl SessionClaims {
    pub fn subject(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

/// Issue a signed token of `kind` for `staff`.
pub fn issue_token(
    staff: &StaffUser,
    kind: TokenKind,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: staff.id.to_string(),
        tenant_id: staff.tenant_id.map(|t| t.to_string()),
        role: staff.role,
        kind,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + kind.lifetime_secs(config) as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    let header = Header::new(Algorithm::EdDSA);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a token, rejecting it unless its kind is `expected`.
pub fn decode_token(
    token: &str,
    expected: TokenKind,
    config: &AuthConfig,
) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    let claims = jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    if claims.kind != expected {
        return Err(AuthError::TokenInvalid(format!(
            "expected a {expected:?} token"
        )));
    }
    Ok(claims)
}
