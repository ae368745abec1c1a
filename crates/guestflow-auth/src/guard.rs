//! Authorization guard.
//!
//! [`authorize`] turns a resolved staff identity into a
//! [`CapabilityContext`]. Every tenant-scoped operation obtains its tenant
//! id from the context, never from caller input, so a staff user can only
//! ever reach the tenant it belongs to.

use guestflow_core::error::{GuestflowError, GuestflowResult};
use guestflow_core::models::staff::{StaffRole, StaffUser};
use uuid::Uuid;

/// What an authenticated staff user may do.
///
/// Only constructed by [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityContext {
    actor_id: Uuid,
    role: StaffRole,
    tenant_id: Option<Uuid>,
}

/// Resolve role and tenant scope for `staff`.
///
/// Inactive identities, and identities whose role and scope disagree, are
/// rejected as `Unauthenticated`.
pub fn authorize(staff: &StaffUser) -> GuestflowResult<CapabilityContext> {
    if !staff.is_active {
        return Err(GuestflowError::Unauthenticated {
            reason: "account is inactive".into(),
        });
    }
    let scoped = staff.tenant_id.is_some();
    let platform = staff.role == StaffRole::PlatformOperator;
    if scoped == platform {
        return Err(GuestflowError::Unauthenticated {
            reason: format!("role {} does not match its scope", staff.role),
        });
    }

    Ok(CapabilityContext {
        actor_id: staff.id,
        role: staff.role,
        tenant_id: staff.tenant_id,
    })
}

impl CapabilityContext {
    pub fn actor_id(&self) -> Uuid {
        self.actor_id
    }

    pub fn role(&self) -> StaffRole {
        self.role
    }

    /// The only tenant this identity may touch. The platform operator has
    /// none and is refused.
    pub fn tenant_scope(&self) -> GuestflowResult<Uuid> {
        self.tenant_id.ok_or_else(|| {
            GuestflowError::forbidden("platform operator has no access to tenant data")
        })
    }

    /// Tenant scope of an owner or admin.
    pub fn require_tenant_admin(&self) -> GuestflowResult<Uuid> {
        let tenant_id = self.tenant_scope()?;
        if !self.role.manages_staff() {
            return Err(GuestflowError::forbidden(format!(
                "role {} may not administer the tenant",
                self.role
            )));
        }
        Ok(tenant_id)
    }

    /// Access to the tenant registry.
    pub fn require_platform(&self) -> GuestflowResult<()> {
        if self.role != StaffRole::PlatformOperator {
            return Err(GuestflowError::forbidden(
                "tenant registry is reserved to the platform operator",
            ));
        }
        Ok(())
    }
}
