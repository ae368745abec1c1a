//! Booking domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GuestflowError, GuestflowResult};
use crate::lifecycle::OccupiedInterval;

pub const DEFAULT_DURATION_MINUTES: u32 = 90;
pub const DEFAULT_BUFFER_MINUTES: u32 = 15;
pub const DEFAULT_PARTY_SIZE: u32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    New,
    Confirmed,
    Arrived,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::New,
        BookingStatus::Confirmed,
        BookingStatus::Arrived,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Arrived => "arrived",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = GuestflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| GuestflowError::Internal(format!("unknown booking status: {s}")))
    }
}

/// Channel through which a booking was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    Bot,
    #[default]
    Manual,
    WalkIn,
}

impl BookingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingSource::Bot => "bot",
            BookingSource::Manual => "manual",
            BookingSource::WalkIn => "walk_in",
        }
    }
}

impl FromStr for BookingSource {
    type Err = GuestflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bot" => Ok(BookingSource::Bot),
            "manual" => Ok(BookingSource::Manual),
            "walk_in" => Ok(BookingSource::WalkIn),
            other => Err(GuestflowError::Internal(format!(
                "unknown booking source: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub guest_id: Uuid,
    pub table_id: Option<Uuid>,
    /// Scheduled start time.
    pub booked_at: DateTime<Utc>,
    pub duration_minutes: u32,
    /// Turnover time appended after `duration_minutes`.
    pub buffer_minutes: u32,
    pub party_size: u32,
    pub status: BookingStatus,
    pub source: BookingSource,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Staff user who recorded the booking, if any.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub tenant_id: Uuid,
    pub guest_id: Uuid,
    pub table_id: Option<Uuid>,
    pub booked_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub party_size: u32,
    pub source: BookingSource,
    pub created_by: Option<Uuid>,
}

impl CreateBooking {
    /// A manual booking with default duration, buffer and party size.
    pub fn new(tenant_id: Uuid, guest_id: Uuid, booked_at: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            guest_id,
            table_id: None,
            booked_at,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            party_size: DEFAULT_PARTY_SIZE,
            source: BookingSource::default(),
            created_by: None,
        }
    }

    pub fn validate(&self) -> GuestflowResult<()> {
        validate_sizes(Some(self.duration_minutes), Some(self.party_size))
    }

    pub fn interval(&self) -> OccupiedInterval {
        OccupiedInterval::new(self.booked_at, self.duration_minutes, self.buffer_minutes)
    }
}

/// In-place overwrite of scheduling fields; never changes status.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBooking {
    pub table_id: Option<Uuid>,
    pub booked_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub buffer_minutes: Option<u32>,
    pub party_size: Option<u32>,
}

impl UpdateBooking {
    pub fn validate(&self) -> GuestflowResult<()> {
        validate_sizes(self.duration_minutes, self.party_size)
    }

    /// Whether the update moves the booking's claim on a table.
    pub fn touches_slot(&self) -> bool {
        self.table_id.is_some()
            || self.booked_at.is_some()
            || self.duration_minutes.is_some()
            || self.buffer_minutes.is_some()
    }
}

fn validate_sizes(duration: Option<u32>, party_size: Option<u32>) -> GuestflowResult<()> {
    if duration == Some(0) {
        return Err(GuestflowError::invalid_request(
            "duration_minutes must be positive",
        ));
    }
    if party_size == Some(0) {
        return Err(GuestflowError::invalid_request("party_size must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_parses_wire_names() {
        assert_eq!("no_show".parse::<BookingStatus>().unwrap(), BookingStatus::NoShow);
        assert!("seated".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn create_defaults_follow_house_rules() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 19, 0, 0).unwrap();
        let input = CreateBooking::new(Uuid::new_v4(), Uuid::new_v4(), at);
        assert_eq!(input.duration_minutes, 90);
        assert_eq!(input.buffer_minutes, 15);
        assert_eq!(input.party_size, 2);
        assert_eq!(input.source, BookingSource::Manual);
        assert_eq!(
            input.interval().end,
            Utc.with_ymd_and_hms(2025, 6, 1, 20, 45, 0).unwrap()
        );
    }

    #[test]
    fn zero_party_size_is_rejected() {
        let update = UpdateBooking {
            party_size: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            update.validate(),
            Err(GuestflowError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn party_size_change_does_not_touch_slot() {
        let update = UpdateBooking {
            party_size: Some(4),
            ..Default::default()
        };
        assert!(!update.touches_slot());
        let update = UpdateBooking {
            buffer_minutes: Some(30),
            ..Default::default()
        };
        assert!(update.touches_slot());
    }
}
