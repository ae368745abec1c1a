//! Booking lifecycle: the transition table and table-occupancy intervals.
//!
//! ```text
//! new ──confirm──> confirmed ──arrive──> arrived ──complete──> completed
//!  │                  │
//!  ├──arrive──────────┘ (new may arrive directly)
//!  ├──no-show / cancel from new or confirmed
//!  └──cancel from arrived
//! ```
//!
//! `completed`, `cancelled` and `no_show` are terminal. Every legal step
//! is a pure function of (current status, action); the store layer
//! enforces the same table through [`BookingAction::allowed_from`] inside
//! its write transaction.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{GuestflowError, GuestflowResult};
use crate::models::booking::BookingStatus;

/// Operation requested against an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Update,
    Confirm,
    MarkArrived,
    MarkCompleted,
    MarkNoShow,
    Cancel,
}

const NON_TERMINAL: &[BookingStatus] = &[
    BookingStatus::New,
    BookingStatus::Confirmed,
    BookingStatus::Arrived,
];

impl BookingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingAction::Update => "update",
            BookingAction::Confirm => "confirm",
            BookingAction::MarkArrived => "mark_arrived",
            BookingAction::MarkCompleted => "mark_completed",
            BookingAction::MarkNoShow => "mark_no_show",
            BookingAction::Cancel => "cancel",
        }
    }

    /// Statuses from which the action is legal.
    pub fn allowed_from(self) -> &'static [BookingStatus] {
        match self {
            BookingAction::Update | BookingAction::Cancel => NON_TERMINAL,
            BookingAction::Confirm => &[BookingStatus::New],
            BookingAction::MarkArrived | BookingAction::MarkNoShow => {
                &[BookingStatus::New, BookingStatus::Confirmed]
            }
            BookingAction::MarkCompleted => &[BookingStatus::Arrived],
        }
    }

    /// Resulting status, or `None` when the action leaves status alone.
    pub fn target(self) -> Option<BookingStatus> {
        match self {
            BookingAction::Update => None,
            BookingAction::Confirm => Some(BookingStatus::Confirmed),
            BookingAction::MarkArrived => Some(BookingStatus::Arrived),
            BookingAction::MarkCompleted => Some(BookingStatus::Completed),
            BookingAction::MarkNoShow => Some(BookingStatus::NoShow),
            BookingAction::Cancel => Some(BookingStatus::Cancelled),
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        !NON_TERMINAL.contains(&self)
    }

    /// Statuses whose bookings still occupy their table.
    pub fn non_terminal() -> &'static [BookingStatus] {
        NON_TERMINAL
    }

    /// Validate `action` from this status and return the next status.
    pub fn apply(self, action: BookingAction) -> GuestflowResult<BookingStatus> {
        if !action.allowed_from().contains(&self) {
            return Err(invalid_transition(self, action));
        }
        Ok(action.target().unwrap_or(self))
    }
}

pub fn invalid_transition(from: BookingStatus, action: BookingAction) -> GuestflowError {
    GuestflowError::InvalidTransition {
        from: from.to_string(),
        action: action.to_string(),
    }
}

/// A state change carrying its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTransition {
    Confirm { table_id: Uuid },
    MarkArrived,
    MarkCompleted,
    MarkNoShow,
    Cancel,
}

impl BookingTransition {
    pub fn action(self) -> BookingAction {
        match self {
            BookingTransition::Confirm { .. } => BookingAction::Confirm,
            BookingTransition::MarkArrived => BookingAction::MarkArrived,
            BookingTransition::MarkCompleted => BookingAction::MarkCompleted,
            BookingTransition::MarkNoShow => BookingAction::MarkNoShow,
            BookingTransition::Cancel => BookingAction::Cancel,
        }
    }
}

/// Half-open window `[start, end)` during which a table is occupied:
/// the scheduled duration plus the trailing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupiedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OccupiedInterval {
    pub fn new(start: DateTime<Utc>, duration_minutes: u32, buffer_minutes: u32) -> Self {
        let minutes = i64::from(duration_minutes) + i64::from(buffer_minutes);
        Self {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    /// `[a1, a2)` and `[b1, b2)` conflict iff `a1 < b2 && b1 < a2`.
    pub fn overlaps(&self, other: &OccupiedInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}
