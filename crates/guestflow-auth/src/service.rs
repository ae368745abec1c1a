//! Session service: authentication, renewal and identity lookup.

use guestflow_core::error::{GuestflowError, GuestflowResult};
use guestflow_core::models::staff::StaffUser;
use guestflow_core::repository::StaffRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::guard::{self, CapabilityContext};
use crate::password;
use crate::token::{self, TokenKind};

/// Input for the authentication flow.
#[derive(Debug)]
pub struct AuthenticateInput {
    pub email: String,
    pub password: String,
    /// Scope to look the email up in; `None` means the platform scope.
    pub tenant_id: Option<Uuid>,
}

/// Credentials handed out by `authenticate` and `renew`.
#[derive(Debug)]
pub struct TokenPair {
    pub session_token: String,
    pub renewal_token: String,
    /// Session token lifetime in seconds.
    pub expires_in: u64,
}

/// Session service.
///
/// Generic over the staff repository so that the auth layer has no
/// dependency on the database crate.
pub struct SessionService<S: StaffRepository> {
    staff_repo: S,
    config: AuthConfig,
}

impl<S: StaffRepository> SessionService<S> {
    pub fn new(staff_repo: S, config: AuthConfig) -> Self {
        Self { staff_repo, config }
    }

    /// Verify email and password within one scope and issue a token pair.
    pub async fn authenticate(&self, input: AuthenticateInput) -> GuestflowResult<TokenPair> {
        let staff = match self
            .staff_repo
            .get_by_email(input.tenant_id, &input.email)
            .await
        {
            Ok(staff) => staff,
            Err(GuestflowError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &staff.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(staff_id = %staff.id, "Rejected authentication: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !staff.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        info!(staff_id = %staff.id, role = %staff.role, "Staff authenticated");
        self.issue_pair(&staff)
    }

    /// Exchange a renewal token for a fresh pair. The identity must still
    /// exist and be active.
    pub async fn renew(&self, renewal_token: &str) -> GuestflowResult<TokenPair> {
        let claims = token::decode_token(renewal_token, TokenKind::Renewal, &self.config)?;
        let staff = self.load_identity(claims.subject()?).await?;
        if !staff.is_active {
            return Err(AuthError::AccountInactive.into());
        }
        self.issue_pair(&staff)
    }

    /// The staff user behind a session token.
    pub async fn whoami(&self, session_token: &str) -> GuestflowResult<StaffUser> {
        let claims = token::decode_token(session_token, TokenKind::Session, &self.config)?;
        self.load_identity(claims.subject()?).await
    }

    /// Resolve a session token into a capability context.
    pub async fn resolve(&self, session_token: &str) -> GuestflowResult<CapabilityContext> {
        let staff = self.whoami(session_token).await?;
        guard::authorize(&staff)
    }

    async fn load_identity(&self, id: Uuid) -> GuestflowResult<StaffUser> {
        self.staff_repo.get_identity(id).await.map_err(|e| match e {
            GuestflowError::NotFound { .. } => {
                AuthError::TokenInvalid("subject no longer exists".into()).into()
            }
            other => other,
        })
    }

    fn issue_pair(&self, staff: &StaffUser) -> GuestflowResult<TokenPair> {
        Ok(TokenPair {
            session_token: token::issue_token(staff, TokenKind::Session, &self.config)?,
            renewal_token: token::issue_token(staff, TokenKind::Renewal, &self.config)?,
            expires_in: self.config.session_token_lifetime_secs,
        })
    }
}
