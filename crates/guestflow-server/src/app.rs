//! Operation facade.
//!
//! [`GuestflowApp`] exposes every logical operation of the booking
//! service. Each call authenticates its session token, resolves the
//! caller's capability context and takes the tenant scope from that
//! context only: tenant ids carried by inputs are overwritten. Store
//! interactions are bounded by the configured timeout; an elapsed
//! deadline surfaces as `Unavailable`.

use std::time::Duration;

use guestflow_auth::{
    AuthConfig, AuthenticateInput, CapabilityContext, SessionService, TokenPair,
};
use guestflow_core::error::{GuestflowError, GuestflowResult};
use guestflow_core::lifecycle::BookingTransition;
use guestflow_core::models::booking::{Booking, CreateBooking, UpdateBooking};
use guestflow_core::models::guest::{CreateGuest, Guest, UpdateGuest};
use guestflow_core::models::staff::{CreateStaff, StaffUser, UpdateStaff};
use guestflow_core::models::table::{CreateTable, DiningTable, UpdateTable};
use guestflow_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use guestflow_core::repository::{
    BookingFilter, BookingRepository, GuestRepository, PaginatedResult, Pagination,
    StaffRepository, TableRepository, TenantRepository,
};
use guestflow_db::repository::{
    SurrealBookingRepository, SurrealGuestRepository, SurrealStaffRepository,
    SurrealTableRepository, SurrealTenantRepository,
};
use surrealdb::{Connection, Surreal};
use tracing::info;
use uuid::Uuid;

/// Default page size of booking listings.
pub const BOOKING_PAGE_SIZE: u64 = 100;

/// Settings of the facade that do not belong to a single component.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub store_timeout: Duration,
    pub default_timezone: String,
}

pub struct GuestflowApp<C: Connection> {
    sessions: SessionService<SurrealStaffRepository<C>>,
    tenants: SurrealTenantRepository<C>,
    staff: SurrealStaffRepository<C>,
    guests: SurrealGuestRepository<C>,
    tables: SurrealTableRepository<C>,
    bookings: SurrealBookingRepository<C>,
    settings: AppSettings,
}

impl<C: Connection> GuestflowApp<C> {
    pub fn new(db: Surreal<C>, auth: AuthConfig, settings: AppSettings) -> Self {
        let staff = match auth.pepper.clone() {
            Some(pepper) => SurrealStaffRepository::with_pepper(db.clone(), pepper),
            None => SurrealStaffRepository::new(db.clone()),
        };
        Self {
            sessions: SessionService::new(staff.clone(), auth),
            tenants: SurrealTenantRepository::new(db.clone()),
            staff,
            guests: SurrealGuestRepository::new(db.clone()),
            tables: SurrealTableRepository::new(db.clone()),
            bookings: SurrealBookingRepository::new(db),
            settings,
        }
    }

    pub fn tenant_repository(&self) -> &SurrealTenantRepository<C> {
        &self.tenants
    }

    pub fn staff_repository(&self) -> &SurrealStaffRepository<C> {
        &self.staff
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = GuestflowResult<T>>,
    ) -> GuestflowResult<T> {
        tokio::time::timeout(self.settings.store_timeout, operation)
            .await
            .map_err(|_| GuestflowError::Unavailable("store did not answer in time".into()))?
    }

    async fn capability(&self, session_token: &str) -> GuestflowResult<CapabilityContext> {
        self.bounded(self.sessions.resolve(session_token)).await
    }

    async fn tenant_scope(&self, session_token: &str) -> GuestflowResult<(CapabilityContext, Uuid)> {
        let ctx = self.capability(session_token).await?;
        let tenant_id = ctx.tenant_scope()?;
        Ok((ctx, tenant_id))
    }

    // -----------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------

    pub async fn authenticate(&self, input: AuthenticateInput) -> GuestflowResult<TokenPair> {
        self.bounded(self.sessions.authenticate(input)).await
    }

    pub async fn renew(&self, renewal_token: &str) -> GuestflowResult<TokenPair> {
        self.bounded(self.sessions.renew(renewal_token)).await
    }

    pub async fn whoami(&self, session_token: &str) -> GuestflowResult<StaffUser> {
        self.bounded(self.sessions.whoami(session_token)).await
    }

    // -----------------------------------------------------------------
    // Tenant registry (platform operator)
    // -----------------------------------------------------------------

    pub async fn list_tenants(
        &self,
        session_token: &str,
        page: Pagination,
    ) -> GuestflowResult<PaginatedResult<Tenant>> {
        self.capability(session_token).await?.require_platform()?;
        self.bounded(self.tenants.list(page)).await
    }

    pub async fn create_tenant(
        &self,
        session_token: &str,
        mut input: CreateTenant,
    ) -> GuestflowResult<Tenant> {
        let ctx = self.capability(session_token).await?;
        ctx.require_platform()?;
        if input.timezone.is_none() {
            input.timezone = Some(self.settings.default_timezone.clone());
        }
        let tenant = self.bounded(self.tenants.create(input)).await?;
        info!(tenant_id = %tenant.id, actor = %ctx.actor_id(), "Tenant created");
        Ok(tenant)
    }

    pub async fn get_tenant(&self, session_token: &str, id: Uuid) -> GuestflowResult<Tenant> {
        self.capability(session_token).await?.require_platform()?;
        self.bounded(self.tenants.get_by_id(id)).await
    }

    pub async fn update_tenant(
        &self,
        session_token: &str,
        id: Uuid,
        input: UpdateTenant,
    ) -> GuestflowResult<Tenant> {
        let ctx = self.capability(session_token).await?;
        ctx.require_platform()?;
        let tenant = self.bounded(self.tenants.update(id, input)).await?;
        info!(tenant_id = %id, actor = %ctx.actor_id(), "Tenant updated");
        Ok(tenant)
    }

    // -----------------------------------------------------------------
    // Tenant self-service
    // -----------------------------------------------------------------

    pub async fn get_current_tenant(&self, session_token: &str) -> GuestflowResult<Tenant> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.tenants.get_by_id(tenant_id)).await
    }

    pub async fn update_current_tenant(
        &self,
        session_token: &str,
        input: UpdateTenant,
    ) -> GuestflowResult<Tenant> {
        let ctx = self.capability(session_token).await?;
        let tenant_id = ctx.require_tenant_admin()?;
        let tenant = self.bounded(self.tenants.update(tenant_id, input)).await?;
        info!(%tenant_id, actor = %ctx.actor_id(), "Tenant profile updated");
        Ok(tenant)
    }

    // -----------------------------------------------------------------
    // Staff (owner / admin)
    // -----------------------------------------------------------------

    pub async fn list_staff(
        &self,
        session_token: &str,
        page: Pagination,
    ) -> GuestflowResult<PaginatedResult<StaffUser>> {
        let tenant_id = self.capability(session_token).await?.require_tenant_admin()?;
        self.bounded(self.staff.list(tenant_id, page)).await
    }

    pub async fn create_staff(
        &self,
        session_token: &str,
        mut input: CreateStaff,
    ) -> GuestflowResult<StaffUser> {
        let ctx = self.capability(session_token).await?;
        let tenant_id = ctx.require_tenant_admin()?;
        input.tenant_id = Some(tenant_id);
        let staff = self.bounded(self.staff.create(input)).await?;
        info!(%tenant_id, staff_id = %staff.id, role = %staff.role, actor = %ctx.actor_id(), "Staff created");
        Ok(staff)
    }

    pub async fn get_staff(&self, session_token: &str, id: Uuid) -> GuestflowResult<StaffUser> {
        let tenant_id = self.capability(session_token).await?.require_tenant_admin()?;
        self.bounded(self.staff.get_by_id(tenant_id, id)).await
    }

    pub async fn update_staff(
        &self,
        session_token: &str,
        id: Uuid,
        input: UpdateStaff,
    ) -> GuestflowResult<StaffUser> {
        let ctx = self.capability(session_token).await?;
        let tenant_id = ctx.require_tenant_admin()?;
        let staff = self.bounded(self.staff.update(tenant_id, id, input)).await?;
        info!(%tenant_id, staff_id = %id, actor = %ctx.actor_id(), "Staff updated");
        Ok(staff)
    }

    // -----------------------------------------------------------------
    // Guest directory
    // -----------------------------------------------------------------

    pub async fn list_guests(
        &self,
        session_token: &str,
        search: Option<&str>,
        page: Pagination,
    ) -> GuestflowResult<PaginatedResult<Guest>> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.guests.search(tenant_id, search, page)).await
    }

    pub async fn create_guest(
        &self,
        session_token: &str,
        mut input: CreateGuest,
    ) -> GuestflowResult<Guest> {
        let (ctx, tenant_id) = self.tenant_scope(session_token).await?;
        input.tenant_id = tenant_id;
        let guest = self.bounded(self.guests.create(input)).await?;
        info!(%tenant_id, guest_id = %guest.id, actor = %ctx.actor_id(), "Guest created");
        Ok(guest)
    }

    pub async fn get_guest(&self, session_token: &str, id: Uuid) -> GuestflowResult<Guest> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.guests.get_by_id(tenant_id, id)).await
    }

    pub async fn update_guest(
        &self,
        session_token: &str,
        id: Uuid,
        input: UpdateGuest,
    ) -> GuestflowResult<Guest> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.guests.update(tenant_id, id, input)).await
    }

    // -----------------------------------------------------------------
    // Table inventory
    // -----------------------------------------------------------------

    pub async fn list_tables(&self, session_token: &str) -> GuestflowResult<Vec<DiningTable>> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.tables.list(tenant_id)).await
    }

    pub async fn create_table(
        &self,
        session_token: &str,
        mut input: CreateTable,
    ) -> GuestflowResult<DiningTable> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        input.tenant_id = tenant_id;
        self.bounded(self.tables.create(input)).await
    }

    pub async fn get_table(&self, session_token: &str, id: Uuid) -> GuestflowResult<DiningTable> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.tables.get_by_id(tenant_id, id)).await
    }

    pub async fn update_table(
        &self,
        session_token: &str,
        id: Uuid,
        input: UpdateTable,
    ) -> GuestflowResult<DiningTable> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.tables.update(tenant_id, id, input)).await
    }

    pub async fn delete_table(&self, session_token: &str, id: Uuid) -> GuestflowResult<()> {
        let (ctx, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.tables.delete(tenant_id, id)).await?;
        info!(%tenant_id, table_id = %id, actor = %ctx.actor_id(), "Table deleted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Booking ledger
    // -----------------------------------------------------------------

    /// `page = None` returns the first [`BOOKING_PAGE_SIZE`] bookings.
    pub async fn list_bookings(
        &self,
        session_token: &str,
        filter: BookingFilter,
        page: Option<Pagination>,
    ) -> GuestflowResult<PaginatedResult<Booking>> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        let page = page.unwrap_or(Pagination::new(0, BOOKING_PAGE_SIZE));
        self.bounded(self.bookings.list(tenant_id, filter, page)).await
    }

    pub async fn get_booking(&self, session_token: &str, id: Uuid) -> GuestflowResult<Booking> {
        let (_, tenant_id) = self.tenant_scope(session_token).await?;
        self.bounded(self.bookings.get_by_id(tenant_id, id)).await
    }

    pub async fn create_booking(
        &self,
        session_token: &str,
        mut input: CreateBooking,
    ) -> GuestflowResult<Booking> {
        let (ctx, tenant_id) = self.tenant_scope(session_token).await?;
        input.tenant_id = tenant_id;
        input.created_by = Some(ctx.actor_id());
        let booking = self.bounded(self.bookings.create(input)).await?;
        info!(
            %tenant_id,
            booking_id = %booking.id,
            booked_at = %booking.booked_at,
            actor = %ctx.actor_id(),
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn update_booking(
        &self,
        session_token: &str,
        id: Uuid,
        input: UpdateBooking,
    ) -> GuestflowResult<Booking> {
        let (ctx, tenant_id) = self.tenant_scope(session_token).await?;
        let booking = self.bounded(self.bookings.update(tenant_id, id, input)).await?;
        info!(%tenant_id, booking_id = %id, actor = %ctx.actor_id(), "Booking updated");
        Ok(booking)
    }

    pub async fn confirm_booking(
        &self,
        session_token: &str,
        id: Uuid,
        table_id: Uuid,
    ) -> GuestflowResult<Booking> {
        self.transition(session_token, id, BookingTransition::Confirm { table_id })
            .await
    }

    pub async fn mark_arrived(&self, session_token: &str, id: Uuid) -> GuestflowResult<Booking> {
        self.transition(session_token, id, BookingTransition::MarkArrived)
            .await
    }

    pub async fn mark_completed(&self, session_token: &str, id: Uuid) -> GuestflowResult<Booking> {
        self.transition(session_token, id, BookingTransition::MarkCompleted)
            .await
    }

    pub async fn mark_no_show(&self, session_token: &str, id: Uuid) -> GuestflowResult<Booking> {
        self.transition(session_token, id, BookingTransition::MarkNoShow)
            .await
    }

    pub async fn cancel_booking(&self, session_token: &str, id: Uuid) -> GuestflowResult<Booking> {
        self.transition(session_token, id, BookingTransition::Cancel)
            .await
    }

    async fn transition(
        &self,
        session_token: &str,
        id: Uuid,
        transition: BookingTransition,
    ) -> GuestflowResult<Booking> {
        let (ctx, tenant_id) = self.tenant_scope(session_token).await?;
        let booking = self
            .bounded(self.bookings.transition(tenant_id, id, transition))
            .await?;
        info!(
            %tenant_id,
            booking_id = %id,
            action = %transition.action(),
            status = %booking.status,
            actor = %ctx.actor_id(),
            "Booking transitioned"
        );
        Ok(booking)
    }
}
