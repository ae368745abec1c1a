//! SurrealDB implementation of [`BookingRepository`].
//!
//! Every write runs as one SurrealQL transaction: the current row is read
//! inside the transaction, the status guard and the table claim abort it
//! with a `THROW`, and the write only commits when both pass. A claim
//! bumps the table's `slot_version`, so two transactions claiming the
//! same table always touch a common key and cannot both commit.
//!
//! Occupied intervals are stored as `[booked_at, occupied_until)` so the
//! overlap test is a plain range predicate.

use chrono::{DateTime, Utc};
use guestflow_core::error::{GuestflowError, GuestflowResult};
use guestflow_core::lifecycle::{BookingAction, BookingTransition};
use guestflow_core::models::booking::{Booking, BookingStatus, CreateBooking, UpdateBooking};
use guestflow_core::repository::{BookingFilter, BookingRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::support::{CountRow, parse_opt_uuid, parse_uuid, settle};
use crate::error::DbError;

/// Reads the booking into `$booking` and rejects the action unless the
/// current status is in `$allowed`.
const GUARD_STATUS: &str = "\
LET $booking = (SELECT * FROM type::record('booking', $id) \
    WHERE tenant_id = $tenant_id)[0];
IF $booking = NONE { THROW string::concat('gf:not_found:booking:', $id) };
IF !($allowed CONTAINS $booking.status) { \
    THROW string::concat('gf:invalid_transition:', $booking.status, ':', $action) };
";

/// Claims `$table_id` for `[$start, $until)` on behalf of booking `$id`.
const CLAIM_TABLE: &str = "\
IF array::len((SELECT VALUE meta::id(id) FROM type::record('dining_table', $table_id) \
    WHERE tenant_id = $tenant_id)) = 0 { \
    THROW string::concat('gf:invalid_reference:table:', $table_id) };
UPDATE type::record('dining_table', $table_id) SET slot_version += 1;
IF array::len((SELECT VALUE meta::id(id) FROM booking \
    WHERE tenant_id = $tenant_id AND table_id = $table_id \
    AND status IN $holding AND meta::id(id) != $id \
    AND booked_at < $until AND occupied_until > $start)) > 0 { \
    THROW string::concat('gf:table_conflict:', $table_id) };
";

const CHECK_GUEST: &str = "\
IF array::len((SELECT VALUE meta::id(id) FROM type::record('guest', $guest_id) \
    WHERE tenant_id = $tenant_id)) = 0 { \
    THROW string::concat('gf:invalid_reference:guest:', $guest_id) };
";

const INSERT_BOOKING: &str = "\
CREATE type::record('booking', $id) SET \
    tenant_id = $tenant_id, guest_id = $guest_id, table_id = $table_id, \
    booked_at = $start, occupied_until = $until, \
    duration_minutes = $duration_minutes, buffer_minutes = $buffer_minutes, \
    party_size = $party_size, status = 'new', source = $source, \
    created_by = $created_by;
";

/// Resolves the schedule an update produces from the supplied `$new_*`
/// fields over the row read by [`GUARD_STATUS`].
const RESOLVE_SCHEDULE: &str = "\
LET $table_id = $new_table_id ?? $booking.table_id;
LET $start = $new_booked_at ?? $booking.booked_at;
LET $span = ($new_duration_minutes ?? $booking.duration_minutes) \
    + ($new_buffer_minutes ?? $booking.buffer_minutes);
LET $until = $start + <duration> string::concat(<string> $span, 'm');
";

const RECORD_VISIT: &str = "\
UPDATE type::record('guest', $booking.guest_id) SET \
    visit_count += 1, last_visit_at = time::now(), updated_at = time::now();
UPDATE type::record('guest', $booking.guest_id) SET first_visit_at = time::now() \
    WHERE first_visit_at = NONE;
";

fn transaction(body: &[&str]) -> String {
    let mut sql = String::from("BEGIN TRANSACTION;\n");
    for part in body {
        sql.push_str(part);
    }
    sql.push_str("COMMIT TRANSACTION;\n");
    sql
}

fn status_names(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Debug, SurrealValue)]
struct BookingRowWithId {
    record_id: String,
    tenant_id: String,
    guest_id: String,
    table_id: Option<String>,
    booked_at: DateTime<Utc>,
    duration_minutes: u32,
    buffer_minutes: u32,
    party_size: u32,
    status: String,
    source: String,
    confirmed_at: Option<DateTime<Utc>>,
    arrived_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRowWithId {
    fn try_into_booking(self) -> Result<Booking, DbError> {
        Ok(Booking {
            id: parse_uuid("booking", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            guest_id: parse_uuid("guest", &self.guest_id)?,
            table_id: parse_opt_uuid("table", self.table_id.as_deref())?,
            booked_at: self.booked_at,
            duration_minutes: self.duration_minutes,
            buffer_minutes: self.buffer_minutes,
            party_size: self.party_size,
            status: self
                .status
                .parse()
                .map_err(|_| DbError::Decode(format!("unknown booking status: {}", self.status)))?,
            source: self
                .source
                .parse()
                .map_err(|_| DbError::Decode(format!("unknown booking source: {}", self.source)))?,
            confirmed_at: self.confirmed_at,
            arrived_at: self.arrived_at,
            completed_at: self.completed_at,
            created_by: parse_opt_uuid("staff", self.created_by.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Booking ledger.
#[derive(Clone)]
pub struct SurrealBookingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn create(&self, input: CreateBooking) -> GuestflowResult<Booking> {
        input.validate()?;
        let id = Uuid::new_v4();
        let interval = input.interval();

        let sql = if input.table_id.is_some() {
            transaction(&[CHECK_GUEST, CLAIM_TABLE, INSERT_BOOKING])
        } else {
            transaction(&[CHECK_GUEST, INSERT_BOOKING])
        };

        let result = self
            .db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("guest_id", input.guest_id.to_string()))
            .bind(("table_id", input.table_id.map(|t| t.to_string())))
            .bind(("start", interval.start))
            .bind(("until", interval.end))
            .bind(("duration_minutes", input.duration_minutes))
            .bind(("buffer_minutes", input.buffer_minutes))
            .bind(("party_size", input.party_size))
            .bind(("source", input.source.as_str().to_string()))
            .bind(("created_by", input.created_by.map(|s| s.to_string())))
            .bind(("holding", status_names(BookingStatus::non_terminal())))
            .await
            .map_err(DbError::from)?;

        settle(result, "booking")?;
        debug!(tenant_id = %input.tenant_id, booking_id = %id, "Booking created");

        self.get_by_id(input.tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> GuestflowResult<Booking> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('booking', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking".into(),
            id: id_str,
        })?;

        Ok(row.try_into_booking()?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateBooking,
    ) -> GuestflowResult<Booking> {
        input.validate()?;

        let mut assignments = Vec::new();
        if input.table_id.is_some() {
            assignments.push("table_id = $table_id");
        }
        if input.booked_at.is_some() {
            assignments.push("booked_at = $start");
        }
        if input.duration_minutes.is_some() {
            assignments.push("duration_minutes = $new_duration_minutes");
        }
        if input.buffer_minutes.is_some() {
            assignments.push("buffer_minutes = $new_buffer_minutes");
        }
        if input.party_size.is_some() {
            assignments.push("party_size = $new_party_size");
        }
        if input.touches_slot() {
            assignments.push("occupied_until = $until");
        }
        assignments.push("updated_at = time::now()");
        let write = format!(
            "UPDATE type::record('booking', $id) SET {};\n",
            assignments.join(", ")
        );

        // Claims the table the row holds inside the transaction.
        let claim = format!("IF $table_id != NONE {{\n{CLAIM_TABLE}}};\n");
        let sql = if input.touches_slot() {
            transaction(&[GUARD_STATUS, RESOLVE_SCHEDULE, &claim, &write])
        } else {
            transaction(&[GUARD_STATUS, RESOLVE_SCHEDULE, &write])
        };

        let result = self
            .db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("allowed", status_names(BookingAction::Update.allowed_from())))
            .bind(("action", BookingAction::Update.as_str().to_string()))
            .bind(("new_table_id", input.table_id.map(|t| t.to_string())))
            .bind(("new_booked_at", input.booked_at))
            .bind(("new_duration_minutes", input.duration_minutes))
            .bind(("new_buffer_minutes", input.buffer_minutes))
            .bind(("new_party_size", input.party_size))
            .bind(("holding", status_names(BookingStatus::non_terminal())))
            .await
            .map_err(DbError::from)?;

        settle(result, "booking")?;
        debug!(%tenant_id, booking_id = %id, "Booking rescheduled");

        self.get_by_id(tenant_id, id).await
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        transition: BookingTransition,
    ) -> GuestflowResult<Booking> {
        let action = transition.action();
        let target = action
            .target()
            .ok_or_else(|| GuestflowError::Internal(format!("{action} has no target status")))?;

        let sql = match transition {
            BookingTransition::Confirm { .. } => transaction(&[
                GUARD_STATUS,
                "LET $start = $booking.booked_at;\n",
                "LET $until = $booking.occupied_until;\n",
                CLAIM_TABLE,
                "UPDATE type::record('booking', $id) SET table_id = $table_id, \
                 status = $target, confirmed_at = time::now(), updated_at = time::now();\n",
            ]),
            BookingTransition::MarkArrived => transaction(&[
                GUARD_STATUS,
                RECORD_VISIT,
                "UPDATE type::record('booking', $id) SET status = $target, \
                 arrived_at = time::now(), updated_at = time::now();\n",
            ]),
            BookingTransition::MarkCompleted => transaction(&[
                GUARD_STATUS,
                "UPDATE type::record('booking', $id) SET status = $target, \
                 completed_at = time::now(), updated_at = time::now();\n",
            ]),
            BookingTransition::MarkNoShow | BookingTransition::Cancel => transaction(&[
                GUARD_STATUS,
                "UPDATE type::record('booking', $id) SET status = $target, \
                 updated_at = time::now();\n",
            ]),
        };

        let mut builder = self
            .db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("allowed", status_names(action.allowed_from())))
            .bind(("action", action.as_str().to_string()))
            .bind(("target", target.as_str().to_string()));
        if let BookingTransition::Confirm { table_id } = transition {
            builder = builder
                .bind(("table_id", table_id.to_string()))
                .bind(("holding", status_names(BookingStatus::non_terminal())));
        }

        let result = builder.await.map_err(DbError::from)?;
        settle(result, "booking")?;
        debug!(%tenant_id, booking_id = %id, %action, status = %target, "Booking transitioned");

        self.get_by_id(tenant_id, id).await
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> GuestflowResult<PaginatedResult<Booking>> {
        let mut conditions = vec!["tenant_id = $tenant_id"];
        if filter.from.is_some() {
            conditions.push("booked_at >= $from");
        }
        if filter.to.is_some() {
            conditions.push("booked_at <= $to");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.table_id.is_some() {
            conditions.push("table_id = $table_id");
        }
        if filter.guest_id.is_some() {
            conditions.push("guest_id = $guest_id");
        }
        let condition = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM booking WHERE {condition} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM booking \
             WHERE {condition} \
             ORDER BY booked_at ASC \
             LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(table_id) = filter.table_id {
            builder = builder.bind(("table_id", table_id.to_string()));
        }
        if let Some(guest_id) = filter.guest_id {
            builder = builder.bind(("guest_id", guest_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<BookingRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_booking())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
