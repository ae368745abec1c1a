//! Tenant domain model.
//!
//! A tenant is an independently operated restaurant account and the root
//! of data isolation: staff, guests, tables and bookings all carry a
//! tenant reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GuestflowError, GuestflowResult};

/// IANA timezone assigned to tenants created without one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Dushanbe";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Display name of the restaurant.
    pub name: String,
    /// IANA timezone name (e.g. `Asia/Dushanbe`).
    pub timezone: String,
    /// Free-form contact metadata (phone, address, ...).
    pub contacts: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    /// Falls back to [`DEFAULT_TIMEZONE`] when absent.
    pub timezone: Option<String>,
    pub contacts: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub timezone: Option<String>,
    pub contacts: Option<serde_json::Value>,
}

impl CreateTenant {
    pub fn validate(&self) -> GuestflowResult<()> {
        require_non_blank("name", &self.name)?;
        if let Some(tz) = &self.timezone {
            validate_timezone(tz)?;
        }
        validate_contacts(self.contacts.as_ref())
    }
}

impl UpdateTenant {
    pub fn validate(&self) -> GuestflowResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(tz) = &self.timezone {
            validate_timezone(tz)?;
        }
        validate_contacts(self.contacts.as_ref())
    }
}

/// Accept only names from the IANA timezone database.
pub fn validate_timezone(timezone: &str) -> GuestflowResult<()> {
    require_non_blank("timezone", timezone)?;
    timezone.parse::<chrono_tz::Tz>().map(|_| ()).map_err(|_| {
        GuestflowError::invalid_request(format!("unknown timezone {timezone}"))
    })
}

fn validate_contacts(contacts: Option<&serde_json::Value>) -> GuestflowResult<()> {
    match contacts {
        None | Some(serde_json::Value::Object(_)) => Ok(()),
        Some(_) => Err(GuestflowError::invalid_request(
            "contacts must be a string-keyed mapping",
        )),
    }
}

/// Reject empty or whitespace-only required text fields.
pub(crate) fn require_non_blank(field: &str, value: &str) -> GuestflowResult<()> {
    if value.trim().is_empty() {
        return Err(GuestflowError::invalid_request(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
