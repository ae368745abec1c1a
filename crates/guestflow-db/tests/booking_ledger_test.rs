//! Integration tests for the booking ledger using in-memory SurrealDB.

use chrono::{DateTime, TimeZone, Utc};
use guestflow_core::error::GuestflowError;
use guestflow_core::lifecycle::BookingTransition;
use guestflow_core::models::booking::{BookingStatus, CreateBooking, UpdateBooking};
use guestflow_core::models::guest::CreateGuest;
use guestflow_core::models::table::CreateTable;
use guestflow_core::models::tenant::CreateTenant;
use guestflow_core::repository::{
    BookingFilter, BookingRepository, GuestRepository, Pagination, TableRepository,
    TenantRepository,
};
use guestflow_db::repository::{
    SurrealBookingRepository, SurrealGuestRepository, SurrealTableRepository,
    SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    tenant_id: Uuid,
    guest_id: Uuid,
    table_id: Uuid,
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
}

async fn tenant_with_guest_and_table(db: &Surreal<Db>, name: &str) -> (Uuid, Uuid, Uuid) {
    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: name.into(),
            timezone: None,
            contacts: None,
        })
        .await
        .unwrap();
    let guest = SurrealGuestRepository::new(db.clone())
        .create(CreateGuest {
            tenant_id: tenant.id,
            phone: "+992900000001".into(),
            name: Some("Rustam".into()),
            birthday: None,
            preferences: None,
            messenger_id: None,
        })
        .await
        .unwrap();
    let table = SurrealTableRepository::new(db.clone())
        .create(CreateTable {
            tenant_id: tenant.id,
            name: "T1".into(),
            capacity: Some(4),
            sort_order: 0,
        })
        .await
        .unwrap();
    (tenant.id, guest.id, table.id)
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    guestflow_db::run_migrations(&db).await.unwrap();

    let (tenant_id, guest_id, table_id) = tenant_with_guest_and_table(&db, "Cafe A").await;
    Fixture {
        db,
        tenant_id,
        guest_id,
        table_id,
    }
}

#[tokio::test]
async fn booking_flow_from_new_to_completed() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let booking = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0)))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::New);
    assert_eq!(booking.duration_minutes, 90);
    assert_eq!(booking.buffer_minutes, 15);
    assert!(booking.table_id.is_none());

    let confirmed = repo
        .transition(
            f.tenant_id,
            booking.id,
            BookingTransition::Confirm {
                table_id: f.table_id,
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.table_id, Some(f.table_id));
    assert!(confirmed.confirmed_at.is_some());

    let mut overlapping = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 30));
    overlapping.table_id = Some(f.table_id);
    let err = repo.create(overlapping).await.unwrap_err();
    assert!(matches!(err, GuestflowError::TableConflict { .. }));

    let arrived = repo
        .transition(f.tenant_id, booking.id, BookingTransition::MarkArrived)
        .await
        .unwrap();
    assert_eq!(arrived.status, BookingStatus::Arrived);
    assert!(arrived.arrived_at.is_some());

    let completed = repo
        .transition(f.tenant_id, booking.id, BookingTransition::MarkCompleted)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert!(completed.completed_at.is_some());

    let err = repo
        .transition(f.tenant_id, booking.id, BookingTransition::Cancel)
        .await
        .unwrap_err();
    match err {
        GuestflowError::InvalidTransition { from, action } => {
            assert_eq!(from, "completed");
            assert_eq!(action, "cancel");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn buffer_counts_towards_occupancy() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let mut first = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    first.table_id = Some(f.table_id);
    repo.create(first).await.unwrap();

    // 19:00 + 90 + 15 = 20:45; 20:40 still collides with the buffer.
    let mut inside_buffer = CreateBooking::new(f.tenant_id, f.guest_id, at(20, 40));
    inside_buffer.table_id = Some(f.table_id);
    assert!(matches!(
        repo.create(inside_buffer).await.unwrap_err(),
        GuestflowError::TableConflict { .. }
    ));

    // Touching intervals do not overlap.
    let mut adjacent = CreateBooking::new(f.tenant_id, f.guest_id, at(20, 45));
    adjacent.table_id = Some(f.table_id);
    repo.create(adjacent).await.unwrap();
}

#[tokio::test]
async fn terminal_bookings_release_their_table() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let mut first = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    first.table_id = Some(f.table_id);
    let first = repo.create(first).await.unwrap();

    let cancelled = repo
        .transition(f.tenant_id, first.id, BookingTransition::Cancel)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let mut second = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 30));
    second.table_id = Some(f.table_id);
    repo.create(second).await.unwrap();
}

#[tokio::test]
async fn confirming_onto_a_taken_table_fails() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let mut holder = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    holder.table_id = Some(f.table_id);
    repo.create(holder).await.unwrap();

    let pending = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(20, 0)))
        .await
        .unwrap();
    let err = repo
        .transition(
            f.tenant_id,
            pending.id,
            BookingTransition::Confirm {
                table_id: f.table_id,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::TableConflict { .. }));

    let unchanged = repo.get_by_id(f.tenant_id, pending.id).await.unwrap();
    assert_eq!(unchanged.status, BookingStatus::New);
    assert!(unchanged.table_id.is_none());
}

#[tokio::test]
async fn cross_tenant_references_are_rejected() {
    let f = setup().await;
    let (other_tenant, other_guest, other_table) =
        tenant_with_guest_and_table(&f.db, "Cafe B").await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let err = repo
        .create(CreateBooking::new(f.tenant_id, other_guest, at(19, 0)))
        .await
        .unwrap_err();
    match err {
        GuestflowError::InvalidReference { entity, .. } => assert_eq!(entity, "guest"),
        other => panic!("unexpected error: {other:?}"),
    }

    let mut foreign_table = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    foreign_table.table_id = Some(other_table);
    let err = repo.create(foreign_table).await.unwrap_err();
    match err {
        GuestflowError::InvalidReference { entity, .. } => assert_eq!(entity, "table"),
        other => panic!("unexpected error: {other:?}"),
    }

    let theirs = repo
        .create(CreateBooking::new(other_tenant, other_guest, at(19, 0)))
        .await
        .unwrap();
    assert!(matches!(
        repo.get_by_id(f.tenant_id, theirs.id).await.unwrap_err(),
        GuestflowError::NotFound { .. }
    ));
    assert!(matches!(
        repo.transition(f.tenant_id, theirs.id, BookingTransition::Cancel)
            .await
            .unwrap_err(),
        GuestflowError::NotFound { .. }
    ));
}

#[tokio::test]
async fn cancelling_twice_is_an_invalid_transition() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let booking = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0)))
        .await
        .unwrap();
    repo.transition(f.tenant_id, booking.id, BookingTransition::Cancel)
        .await
        .unwrap();

    let err = repo
        .transition(f.tenant_id, booking.id, BookingTransition::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn completing_requires_arrival() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let booking = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0)))
        .await
        .unwrap();
    let err = repo
        .transition(f.tenant_id, booking.id, BookingTransition::MarkCompleted)
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::InvalidTransition { .. }));

    let no_show = repo
        .transition(f.tenant_id, booking.id, BookingTransition::MarkNoShow)
        .await
        .unwrap();
    assert_eq!(no_show.status, BookingStatus::NoShow);
}

#[tokio::test]
async fn arrival_records_guest_visit() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());
    let guests = SurrealGuestRepository::new(f.db.clone());

    for hour in [12, 18] {
        let booking = repo
            .create(CreateBooking::new(f.tenant_id, f.guest_id, at(hour, 0)))
            .await
            .unwrap();
        repo.transition(f.tenant_id, booking.id, BookingTransition::MarkArrived)
            .await
            .unwrap();
    }

    let guest = guests.get_by_id(f.tenant_id, f.guest_id).await.unwrap();
    assert_eq!(guest.visit_count, 2);
    let first = guest.first_visit_at.unwrap();
    let last = guest.last_visit_at.unwrap();
    assert!(first <= last);
}

#[tokio::test]
async fn rescheduling_rechecks_the_table() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let mut early = CreateBooking::new(f.tenant_id, f.guest_id, at(17, 0));
    early.table_id = Some(f.table_id);
    repo.create(early).await.unwrap();

    let mut late = CreateBooking::new(f.tenant_id, f.guest_id, at(21, 0));
    late.table_id = Some(f.table_id);
    let late = repo.create(late).await.unwrap();

    let err = repo
        .update(
            f.tenant_id,
            late.id,
            UpdateBooking {
                booked_at: Some(at(18, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::TableConflict { .. }));

    let moved = repo
        .update(
            f.tenant_id,
            late.id,
            UpdateBooking {
                booked_at: Some(at(21, 30)),
                party_size: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.booked_at, at(21, 30));
    assert_eq!(moved.party_size, 6);
    assert_eq!(moved.status, BookingStatus::New);
}

#[tokio::test]
async fn terminal_bookings_cannot_be_updated() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let booking = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0)))
        .await
        .unwrap();
    repo.transition(f.tenant_id, booking.id, BookingTransition::Cancel)
        .await
        .unwrap();

    let err = repo
        .update(
            f.tenant_id,
            booking.id,
            UpdateBooking {
                party_size: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GuestflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn deleting_a_table_detaches_its_bookings() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());
    let tables = SurrealTableRepository::new(f.db.clone());

    let mut input = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    input.table_id = Some(f.table_id);
    let booking = repo.create(input).await.unwrap();

    tables.delete(f.tenant_id, f.table_id).await.unwrap();

    let detached = repo.get_by_id(f.tenant_id, booking.id).await.unwrap();
    assert!(detached.table_id.is_none());
    assert_eq!(detached.status, BookingStatus::New);
}

#[tokio::test]
async fn list_filters_and_orders_by_time() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    for hour in [21, 12, 18] {
        repo.create(CreateBooking::new(f.tenant_id, f.guest_id, at(hour, 0)))
            .await
            .unwrap();
    }
    let cancelled = repo
        .create(CreateBooking::new(f.tenant_id, f.guest_id, at(9, 0)))
        .await
        .unwrap();
    repo.transition(f.tenant_id, cancelled.id, BookingTransition::Cancel)
        .await
        .unwrap();

    let all = repo
        .list(f.tenant_id, BookingFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 4);
    let hours: Vec<_> = all.items.iter().map(|b| b.booked_at).collect();
    assert_eq!(hours, [at(9, 0), at(12, 0), at(18, 0), at(21, 0)]);

    let window = repo
        .list(
            f.tenant_id,
            BookingFilter {
                from: Some(at(12, 0)),
                to: Some(at(18, 0)),
                status: Some(BookingStatus::New),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(window.total, 2);
    assert_eq!(window.items[0].booked_at, at(12, 0));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

fn lost_race(err: &GuestflowError) -> bool {
    matches!(err, GuestflowError::Unavailable(_))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirms_claim_a_slot_once() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    for round in 0..6 {
        let start = at(8 + 2 * round, 0);
        let first = repo
            .create(CreateBooking::new(f.tenant_id, f.guest_id, start))
            .await
            .unwrap();
        let second = repo
            .create(CreateBooking::new(f.tenant_id, f.guest_id, start))
            .await
            .unwrap();

        let handles: Vec<_> = [first.id, second.id]
            .into_iter()
            .map(|id| {
                let repo = repo.clone();
                let (tenant_id, table_id) = (f.tenant_id, f.table_id);
                tokio::spawn(async move {
                    repo.transition(tenant_id, id, BookingTransition::Confirm { table_id })
                        .await
                })
            })
            .collect();

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(booking) => {
                    assert_eq!(booking.table_id, Some(f.table_id));
                    confirmed += 1;
                }
                Err(err) => assert!(
                    matches!(err, GuestflowError::TableConflict { .. }) || lost_race(&err),
                    "{err:?}"
                ),
            }
        }
        assert!(confirmed <= 1);

        let holding = repo
            .list(
                f.tenant_id,
                BookingFilter {
                    table_id: Some(f.table_id),
                    from: Some(start),
                    to: Some(start),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(holding.total, confirmed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_apply_once() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    for round in 0..6 {
        let booking = repo
            .create(CreateBooking::new(f.tenant_id, f.guest_id, at(12 + round, 0)))
            .await
            .unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let repo = repo.clone();
                let tenant_id = f.tenant_id;
                tokio::spawn(async move {
                    repo.transition(tenant_id, booking.id, BookingTransition::Cancel)
                        .await
                })
            })
            .collect();

        let mut cancelled = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(booking) => {
                    assert_eq!(booking.status, BookingStatus::Cancelled);
                    cancelled += 1;
                }
                Err(err) => assert!(
                    matches!(err, GuestflowError::InvalidTransition { .. }) || lost_race(&err),
                    "{err:?}"
                ),
            }
        }
        assert_eq!(cancelled, 1);

        let stored = repo.get_by_id(f.tenant_id, booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn update_racing_confirm_keeps_the_table() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    for round in 0..6 {
        let booking = repo
            .create(CreateBooking::new(f.tenant_id, f.guest_id, at(8 + 2 * round, 0)))
            .await
            .unwrap();

        let resize = {
            let repo = repo.clone();
            let tenant_id = f.tenant_id;
            tokio::spawn(async move {
                let update = UpdateBooking {
                    party_size: Some(5),
                    ..Default::default()
                };
                repo.update(tenant_id, booking.id, update).await
            })
        };
        let confirm = {
            let repo = repo.clone();
            let (tenant_id, table_id) = (f.tenant_id, f.table_id);
            tokio::spawn(async move {
                repo.transition(tenant_id, booking.id, BookingTransition::Confirm { table_id })
                    .await
            })
        };
        let resize = resize.await.unwrap();
        let confirm = confirm.await.unwrap();

        let stored = repo.get_by_id(f.tenant_id, booking.id).await.unwrap();
        if stored.status == BookingStatus::Confirmed {
            assert_eq!(stored.table_id, Some(f.table_id));
        } else {
            assert_eq!(stored.status, BookingStatus::New);
            assert!(stored.table_id.is_none());
        }
        match resize {
            Ok(_) => assert_eq!(stored.party_size, 5),
            Err(err) => assert!(lost_race(&err), "{err:?}"),
        }
        match confirm {
            Ok(_) => assert_eq!(stored.status, BookingStatus::Confirmed),
            Err(err) => assert!(lost_race(&err), "{err:?}"),
        }
    }
}

#[tokio::test]
async fn partial_update_preserves_table_and_time() {
    let f = setup().await;
    let repo = SurrealBookingRepository::new(f.db.clone());

    let mut input = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 0));
    input.table_id = Some(f.table_id);
    let booking = repo.create(input).await.unwrap();

    let updated = repo
        .update(
            f.tenant_id,
            booking.id,
            UpdateBooking {
                party_size: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.party_size, 6);
    assert_eq!(updated.table_id, Some(f.table_id));
    assert_eq!(updated.booked_at, at(19, 0));
    assert_eq!(updated.duration_minutes, booking.duration_minutes);

    // The stored occupancy still follows the original schedule.
    let mut overlapping = CreateBooking::new(f.tenant_id, f.guest_id, at(20, 40));
    overlapping.table_id = Some(f.table_id);
    assert!(matches!(
        repo.create(overlapping).await.unwrap_err(),
        GuestflowError::TableConflict { .. }
    ));

    let extended = repo
        .update(
            f.tenant_id,
            booking.id,
            UpdateBooking {
                duration_minutes: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(extended.duration_minutes, 30);
    let mut after = CreateBooking::new(f.tenant_id, f.guest_id, at(19, 45));
    after.table_id = Some(f.table_id);
    repo.create(after).await.unwrap();
}
