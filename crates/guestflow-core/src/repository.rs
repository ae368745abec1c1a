//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take
//! the caller's `tenant_id` as a mandatory filter on every read and
//! write; a record belonging to another tenant is reported as absent.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GuestflowResult;
use crate::lifecycle::BookingTransition;
use crate::models::{
    booking::{Booking, BookingStatus, CreateBooking, UpdateBooking},
    guest::{CreateGuest, Guest, UpdateGuest},
    staff::{CreateStaff, StaffUser, UpdateStaff},
    table::{CreateTable, DiningTable, UpdateTable},
    tenant::{CreateTenant, Tenant, UpdateTenant},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenant registry (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = GuestflowResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GuestflowResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = GuestflowResult<Tenant>> + Send;
    /// First tenant with exactly this name, if any.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = GuestflowResult<Option<Tenant>>> + Send;
    /// Ordered by name.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GuestflowResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Staff (tenant scope, or the reserved platform scope)
// ---------------------------------------------------------------------------

pub trait StaffRepository: Send + Sync {
    /// Fails with `Conflict` when the email already exists in the scope.
    fn create(&self, input: CreateStaff) -> impl Future<Output = GuestflowResult<StaffUser>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GuestflowResult<StaffUser>> + Send;
    /// Look up a session subject regardless of scope.
    fn get_identity(&self, id: Uuid) -> impl Future<Output = GuestflowResult<StaffUser>> + Send;
    /// `tenant_id = None` searches the platform scope only.
    fn get_by_email(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
    ) -> impl Future<Output = GuestflowResult<StaffUser>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateStaff,
    ) -> impl Future<Output = GuestflowResult<StaffUser>> + Send;
    /// Ordered by email.
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GuestflowResult<PaginatedResult<StaffUser>>> + Send;
}

// ---------------------------------------------------------------------------
// Guest directory (tenant scope)
// ---------------------------------------------------------------------------

pub trait GuestRepository: Send + Sync {
    /// Fails with `Conflict` when (tenant, phone) already exists.
    fn create(&self, input: CreateGuest) -> impl Future<Output = GuestflowResult<Guest>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GuestflowResult<Guest>> + Send;
    fn get_by_phone(
        &self,
        tenant_id: Uuid,
        phone: &str,
    ) -> impl Future<Output = GuestflowResult<Guest>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateGuest,
    ) -> impl Future<Output = GuestflowResult<Guest>> + Send;
    /// Case-insensitive substring match on phone or name, newest first.
    fn search(
        &self,
        tenant_id: Uuid,
        term: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = GuestflowResult<PaginatedResult<Guest>>> + Send;
}

// ---------------------------------------------------------------------------
// Table inventory (tenant scope)
// ---------------------------------------------------------------------------

pub trait TableRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTable,
    ) -> impl Future<Output = GuestflowResult<DiningTable>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GuestflowResult<DiningTable>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateTable,
    ) -> impl Future<Output = GuestflowResult<DiningTable>> + Send;
    /// Hard delete. Bookings referencing the table keep existing with
    /// their table reference cleared.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = GuestflowResult<()>> + Send;
    /// Ordered by (sort_order, name).
    fn list(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GuestflowResult<Vec<DiningTable>>> + Send;
}

// ---------------------------------------------------------------------------
// Booking ledger (tenant scope)
// ---------------------------------------------------------------------------

/// Filters for listing bookings. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Inclusive lower bound on `booked_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `booked_at`.
    pub to: Option<DateTime<Utc>>,
    pub status: Option<BookingStatus>,
    pub table_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
}

pub trait BookingRepository: Send + Sync {
    /// Create in status `new`. Guest and table must resolve within the
    /// tenant (`InvalidReference`); a table must be free for the
    /// booking's interval (`TableConflict`).
    fn create(&self, input: CreateBooking) -> impl Future<Output = GuestflowResult<Booking>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GuestflowResult<Booking>> + Send;
    /// Overwrite scheduling fields of a non-terminal booking.
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateBooking,
    ) -> impl Future<Output = GuestflowResult<Booking>> + Send;
    /// Apply a lifecycle transition as one atomic read-validate-write.
    fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        transition: BookingTransition,
    ) -> impl Future<Output = GuestflowResult<Booking>> + Send;
    /// Ordered by `booked_at` ascending.
    fn list(
        &self,
        tenant_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GuestflowResult<PaginatedResult<Booking>>> + Send;
}
