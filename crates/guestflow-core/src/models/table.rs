//! Dining table domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::require_non_blank;
use crate::error::{GuestflowError, GuestflowResult};

/// A physical table in a restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub capacity: Option<u32>,
    /// Display ordering; lower values first.
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTable {
    pub tenant_id: Uuid,
    pub name: String,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTable {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub sort_order: Option<i32>,
}

impl CreateTable {
    pub fn validate(&self) -> GuestflowResult<()> {
        require_non_blank("name", &self.name)?;
        validate_capacity(self.capacity)
    }
}

impl UpdateTable {
    pub fn validate(&self) -> GuestflowResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        validate_capacity(self.capacity)
    }
}

fn validate_capacity(capacity: Option<u32>) -> GuestflowResult<()> {
    if capacity == Some(0) {
        return Err(GuestflowError::invalid_request("capacity must be positive"));
    }
    Ok(())
}
