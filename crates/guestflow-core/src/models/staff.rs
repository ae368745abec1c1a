//! Staff user domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::require_non_blank;
use crate::error::{GuestflowError, GuestflowResult};

/// Privilege level of a staff user.
///
/// `PlatformOperator` manages the tenant registry and has no tenant
/// scope; every other role is bound to exactly one tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    PlatformOperator,
    Owner,
    Admin,
    Manager,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::PlatformOperator => "platform_operator",
            StaffRole::Owner => "owner",
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
        }
    }

    /// Roles allowed to create, list and update staff records.
    pub fn manages_staff(self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Admin)
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = GuestflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_operator" => Ok(StaffRole::PlatformOperator),
            "owner" => Ok(StaffRole::Owner),
            "admin" => Ok(StaffRole::Admin),
            "manager" => Ok(StaffRole::Manager),
            other => Err(GuestflowError::Internal(format!("unknown staff role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: Uuid,
    /// `None` only for the platform operator.
    pub tenant_id: Option<Uuid>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaff {
    /// `None` provisions into the reserved platform scope.
    pub tenant_id: Option<Uuid>,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateStaff {
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub is_active: Option<bool>,
}

impl CreateStaff {
    /// A platform operator must live in the platform scope and a tenant
    /// role must live in a tenant.
    pub fn validate(&self) -> GuestflowResult<()> {
        require_non_blank("email", &self.email)?;
        require_non_blank("password", &self.password)?;
        match (self.tenant_id, self.role) {
            (Some(_), StaffRole::PlatformOperator) => Err(GuestflowError::invalid_request(
                "cannot create a platform operator inside a tenant",
            )),
            (None, role) if role != StaffRole::PlatformOperator => Err(
                GuestflowError::invalid_request(format!("role {role} requires a tenant")),
            ),
            _ => Ok(()),
        }
    }
}

impl UpdateStaff {
    pub fn validate(&self) -> GuestflowResult<()> {
        if let Some(email) = &self.email {
            require_non_blank("email", email)?;
        }
        if self.role == Some(StaffRole::PlatformOperator) {
            return Err(GuestflowError::invalid_request(
                "cannot assign the platform operator role inside a tenant",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_roundtrip() {
        for role in [
            StaffRole::PlatformOperator,
            StaffRole::Owner,
            StaffRole::Admin,
            StaffRole::Manager,
        ] {
            assert_eq!(role.as_str().parse::<StaffRole>().unwrap(), role);
        }
    }

    #[test]
    fn only_owner_and_admin_manage_staff() {
        assert!(StaffRole::Owner.manages_staff());
        assert!(StaffRole::Admin.manages_staff());
        assert!(!StaffRole::Manager.manages_staff());
        assert!(!StaffRole::PlatformOperator.manages_staff());
    }

    #[test]
    fn platform_operator_inside_tenant_is_invalid() {
        let input = CreateStaff {
            tenant_id: Some(Uuid::new_v4()),
            email: "root@example.com".into(),
            password: "secret".into(),
            role: StaffRole::PlatformOperator,
        };
        assert!(matches!(
            input.validate(),
            Err(GuestflowError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn tenant_role_without_tenant_is_invalid() {
        let input = CreateStaff {
            tenant_id: None,
            email: "owner@example.com".into(),
            password: "secret".into(),
            role: StaffRole::Owner,
        };
        assert!(input.validate().is_err());
    }
}
