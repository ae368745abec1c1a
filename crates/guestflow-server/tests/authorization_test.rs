//! Role and tenant-scope enforcement through the operation facade.

mod common;

use guestflow_core::error::GuestflowError;
use guestflow_core::models::guest::CreateGuest;
use guestflow_core::models::staff::{CreateStaff, StaffRole, UpdateStaff};
use guestflow_core::models::tenant::{CreateTenant, UpdateTenant};
use guestflow_core::repository::Pagination;
use uuid::Uuid;

use common::harness;

fn staff(email: &str, role: StaffRole) -> CreateStaff {
    CreateStaff {
        tenant_id: None,
        email: email.into(),
        password: "manager-secret".into(),
        role,
    }
}

#[tokio::test]
async fn only_owner_and_admin_manage_staff() {
    let h = harness().await;
    let (tenant_id, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;

    let manager = h
        .app
        .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Manager))
        .await
        .unwrap();
    assert_eq!(manager.tenant_id, Some(tenant_id));

    let manager_token = h
        .login("host@cafe-a.example", "manager-secret", Some(tenant_id))
        .await;
    assert!(matches!(
        h.app
            .create_staff(&manager_token, staff("other@cafe-a.example", StaffRole::Manager))
            .await
            .unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
    assert!(matches!(
        h.app
            .list_staff(&manager_token, Pagination::default())
            .await
            .unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));

    // Managers still run the floor.
    h.app
        .create_guest(
            &manager_token,
            CreateGuest {
                tenant_id: Uuid::nil(),
                phone: "+992900000001".into(),
                name: None,
                birthday: None,
                preferences: None,
                messenger_id: None,
            },
        )
        .await
        .unwrap();

    let page = h.app.list_staff(&owner, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn platform_operator_cannot_be_created_inside_a_tenant() {
    let h = harness().await;
    let (_, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;

    let err = h
        .app
        .create_staff(&owner, staff("root2@cafe-a.example", StaffRole::PlatformOperator))
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::InvalidRequest { .. }));

    let manager = h
        .app
        .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Manager))
        .await
        .unwrap();
    let err = h
        .app
        .update_staff(
            &owner,
            manager.id,
            UpdateStaff {
                role: Some(StaffRole::PlatformOperator),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::InvalidRequest { .. }));
}

#[tokio::test]
async fn duplicate_staff_email_is_a_conflict() {
    let h = harness().await;
    let (_, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;

    h.app
        .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Admin))
        .await
        .unwrap();
    assert!(matches!(
        h.app
            .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Manager))
            .await
            .unwrap_err(),
        GuestflowError::Conflict { .. }
    ));
}

#[tokio::test]
async fn platform_operator_has_no_tenant_data_access() {
    let h = harness().await;
    h.tenant_owner("Cafe A", "owner@cafe-a.example").await;
    let operator = h.operator_token().await;

    assert!(matches!(
        h.app
            .list_guests(&operator, None, Pagination::default())
            .await
            .unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
    assert!(matches!(
        h.app.list_tables(&operator).await.unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
    assert!(matches!(
        h.app.get_current_tenant(&operator).await.unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
}

#[tokio::test]
async fn tenant_registry_is_reserved_to_the_platform_operator() {
    let h = harness().await;
    let (tenant_id, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;
    let operator = h.operator_token().await;

    let created = h
        .app
        .create_tenant(
            &operator,
            CreateTenant {
                name: "Cafe B".into(),
                timezone: None,
                contacts: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.timezone, "Asia/Dushanbe");

    let page = h.app.list_tenants(&operator, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(h.app.get_tenant(&operator, tenant_id).await.unwrap().name, "Cafe A");

    let renamed = h
        .app
        .update_tenant(
            &operator,
            created.id,
            UpdateTenant {
                name: Some("Cafe B2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Cafe B2");

    assert!(matches!(
        h.app
            .list_tenants(&owner, Pagination::default())
            .await
            .unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
}

#[tokio::test]
async fn owner_maintains_the_current_tenant_and_manager_reads_it() {
    let h = harness().await;
    let (tenant_id, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;
    h.app
        .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Manager))
        .await
        .unwrap();
    let manager = h
        .login("host@cafe-a.example", "manager-secret", Some(tenant_id))
        .await;

    let updated = h
        .app
        .update_current_tenant(
            &owner,
            UpdateTenant {
                contacts: Some(serde_json::json!({ "phone": "+992441000000" })),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.contacts["phone"], "+992441000000");

    assert_eq!(h.app.get_current_tenant(&manager).await.unwrap().id, tenant_id);
    assert!(matches!(
        h.app
            .update_current_tenant(&manager, UpdateTenant::default())
            .await
            .unwrap_err(),
        GuestflowError::Forbidden { .. }
    ));
}

#[tokio::test]
async fn deactivated_staff_lose_access_immediately() {
    let h = harness().await;
    let (tenant_id, owner) = h.tenant_owner("Cafe A", "owner@cafe-a.example").await;
    let manager = h
        .app
        .create_staff(&owner, staff("host@cafe-a.example", StaffRole::Manager))
        .await
        .unwrap();
    let manager_token = h
        .login("host@cafe-a.example", "manager-secret", Some(tenant_id))
        .await;

    h.app
        .update_staff(
            &owner,
            manager.id,
            UpdateStaff {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        h.app.list_tables(&manager_token).await.unwrap_err(),
        GuestflowError::Unauthenticated { .. }
    ));
    assert!(matches!(
        h.app.list_tables("garbage").await.unwrap_err(),
        GuestflowError::Unauthenticated { .. }
    ));
}
