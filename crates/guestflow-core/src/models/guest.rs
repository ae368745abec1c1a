//! Guest domain model.
//!
//! Guests form a per-tenant directory. The phone number is the merge key:
//! at most one guest exists per (tenant, phone).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::require_non_blank;
use crate::error::GuestflowResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Free-form preferences (seating, allergies, ...).
    pub preferences: serde_json::Value,
    /// External messaging id (e.g. a chat bot user id).
    pub messenger_id: Option<i64>,
    pub visit_count: u32,
    pub first_visit_at: Option<DateTime<Utc>>,
    pub last_visit_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGuest {
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub preferences: Option<serde_json::Value>,
    pub messenger_id: Option<i64>,
}

/// Partial update: only supplied fields are overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGuest {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub preferences: Option<serde_json::Value>,
    pub messenger_id: Option<i64>,
}

impl CreateGuest {
    pub fn validate(&self) -> GuestflowResult<()> {
        require_non_blank("phone", &self.phone)
    }
}

impl UpdateGuest {
    pub fn validate(&self) -> GuestflowResult<()> {
        if let Some(phone) = &self.phone {
            require_non_blank("phone", phone)?;
        }
        Ok(())
    }
}

/// Lowercased text the directory search matches against.
pub fn search_text(phone: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} {}", phone, name).to_lowercase(),
        None => phone.to_lowercase(),
    }
}
