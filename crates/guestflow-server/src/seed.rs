//! Idempotent provisioning of the platform operator and of a tenant with
//! its owner.

use guestflow_core::error::{GuestflowError, GuestflowResult};
use guestflow_core::models::staff::{CreateStaff, StaffRole, StaffUser};
use guestflow_core::models::tenant::{CreateTenant, Tenant};
use guestflow_core::repository::{StaffRepository, TenantRepository};
use serde_json::json;
use tracing::info;

/// A tenant to provision together with its first owner.
#[derive(Debug, Clone)]
pub struct TenantSeed {
    pub name: String,
    pub timezone: String,
    pub owner_email: String,
    pub owner_password: String,
}

async fn existing<S: StaffRepository>(
    staff: &S,
    tenant_id: Option<uuid::Uuid>,
    email: &str,
) -> GuestflowResult<Option<StaffUser>> {
    match staff.get_by_email(tenant_id, email).await {
        Ok(user) => Ok(Some(user)),
        Err(GuestflowError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create the platform operator unless the email already exists in the
/// platform scope.
pub async fn seed_platform_operator<S: StaffRepository>(
    staff: &S,
    email: &str,
    password: &str,
) -> GuestflowResult<StaffUser> {
    if let Some(user) = existing(staff, None, email).await? {
        info!(staff_id = %user.id, "Platform operator already provisioned");
        return Ok(user);
    }

    let user = staff
        .create(CreateStaff {
            tenant_id: None,
            email: email.into(),
            password: password.into(),
            role: StaffRole::PlatformOperator,
        })
        .await?;
    info!(staff_id = %user.id, "Platform operator provisioned");
    Ok(user)
}

/// Create the tenant (matched by name) and its owner; whatever already
/// exists is left untouched.
pub async fn seed_tenant_with_owner<T, S>(
    tenants: &T,
    staff: &S,
    seed: TenantSeed,
) -> GuestflowResult<(Tenant, StaffUser)>
where
    T: TenantRepository,
    S: StaffRepository,
{
    let tenant = match tenants.find_by_name(&seed.name).await? {
        Some(tenant) => tenant,
        None => {
            let tenant = tenants
                .create(CreateTenant {
                    name: seed.name,
                    timezone: Some(seed.timezone),
                    contacts: Some(json!({ "phone": "", "email": "", "address": "" })),
                })
                .await?;
            info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant provisioned");
            tenant
        }
    };

    if let Some(owner) = existing(staff, Some(tenant.id), &seed.owner_email).await? {
        return Ok((tenant, owner));
    }

    let owner = staff
        .create(CreateStaff {
            tenant_id: Some(tenant.id),
            email: seed.owner_email,
            password: seed.owner_password,
            role: StaffRole::Owner,
        })
        .await?;
    info!(tenant_id = %tenant.id, staff_id = %owner.id, "Tenant owner provisioned");
    Ok((tenant, owner))
}
