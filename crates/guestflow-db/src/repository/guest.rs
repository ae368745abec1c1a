//! SurrealDB implementation of [`GuestRepository`].
//!
//! Birthdays are stored as `YYYY-MM-DD` strings. Each row carries a
//! lowercased `search_text` (phone and name) so directory search is a
//! single substring match.

use chrono::{DateTime, NaiveDate, Utc};
use guestflow_core::error::GuestflowResult;
use guestflow_core::models::guest::{CreateGuest, Guest, UpdateGuest, search_text};
use guestflow_core::repository::{GuestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, checked, parse_uuid};
use crate::error::DbError;

const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, SurrealValue)]
struct GuestRowWithId {
    record_id: String,
    tenant_id: String,
    phone: String,
    name: Option<String>,
    birthday: Option<String>,
    preferences: serde_json::Value,
    messenger_id: Option<i64>,
    visit_count: u32,
    first_visit_at: Option<DateTime<Utc>>,
    last_visit_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GuestRowWithId {
    fn try_into_guest(self) -> Result<Guest, DbError> {
        let birthday = self
            .birthday
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, BIRTHDAY_FORMAT)
                    .map_err(|e| DbError::Decode(format!("invalid birthday {raw}: {e}")))
            })
            .transpose()?;

        Ok(Guest {
            id: parse_uuid("guest", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            phone: self.phone,
            name: self.name,
            birthday,
            preferences: self.preferences,
            messenger_id: self.messenger_id,
            visit_count: self.visit_count,
            first_visit_at: self.first_visit_at,
            last_visit_at: self.last_visit_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn format_birthday(birthday: Option<NaiveDate>) -> Option<String> {
    birthday.map(|d| d.format(BIRTHDAY_FORMAT).to_string())
}

fn duplicate_phone(phone: &str) -> DbError {
    DbError::Duplicate {
        entity: "guest".into(),
        reason: format!("phone {phone} already exists"),
    }
}

/// SurrealDB implementation of the Guest repository.
#[derive(Clone)]
pub struct SurrealGuestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGuestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_one(&self, tenant_id: Uuid, id: Uuid) -> Result<Guest, DbError> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('guest', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;

        let rows: Vec<GuestRowWithId> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "guest".into(),
            id: id_str,
        })?;

        row.try_into_guest()
    }

    async fn phone_owner(&self, tenant_id: Uuid, phone: &str) -> Result<Option<Uuid>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM guest \
                 WHERE tenant_id = $tenant_id AND phone = $phone",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("phone", phone.to_string()))
            .await?;

        let rows: Vec<GuestRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| parse_uuid("guest", &row.record_id))
            .transpose()
    }
}

impl<C: Connection> GuestRepository for SurrealGuestRepository<C> {
    async fn create(&self, input: CreateGuest) -> GuestflowResult<Guest> {
        input.validate()?;
        let phone = input.phone.trim().to_string();

        if self.phone_owner(input.tenant_id, &phone).await?.is_some() {
            return Err(duplicate_phone(&phone).into());
        }

        let id = Uuid::new_v4();
        let search = search_text(&phone, input.name.as_deref());
        let preferences = input
            .preferences
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('guest', $id) SET \
                 tenant_id = $tenant_id, phone = $phone, \
                 name = $name, birthday = $birthday, \
                 preferences = $preferences, \
                 messenger_id = $messenger_id, \
                 search_text = $search_text",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("phone", phone))
            .bind(("name", input.name))
            .bind(("birthday", format_birthday(input.birthday)))
            .bind(("preferences", preferences))
            .bind(("messenger_id", input.messenger_id))
            .bind(("search_text", search))
            .await
            .map_err(DbError::from)?;

        checked(result, "guest")?;

        Ok(self.fetch_one(input.tenant_id, id).await?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> GuestflowResult<Guest> {
        Ok(self.fetch_one(tenant_id, id).await?)
    }

    async fn get_by_phone(&self, tenant_id: Uuid, phone: &str) -> GuestflowResult<Guest> {
        let phone = phone.trim();
        let id = self
            .phone_owner(tenant_id, phone)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "guest".into(),
                id: format!("phone={phone}"),
            })?;

        Ok(self.fetch_one(tenant_id, id).await?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateGuest) -> GuestflowResult<Guest> {
        input.validate()?;

        let phone = input.phone.as_deref().map(str::trim).map(str::to_string);
        if let Some(phone) = &phone {
            if let Some(owner) = self.phone_owner(tenant_id, phone).await? {
                if owner != id {
                    return Err(duplicate_phone(phone).into());
                }
            }
        }

        let mut assignments = Vec::new();
        if phone.is_some() {
            assignments.push("phone = $phone");
        }
        if input.name.is_some() {
            assignments.push("name = $name");
        }
        if input.birthday.is_some() {
            assignments.push("birthday = $birthday");
        }
        if input.preferences.is_some() {
            assignments.push("preferences = $preferences");
        }
        if input.messenger_id.is_some() {
            assignments.push("messenger_id = $messenger_id");
        }
        if phone.is_some() || input.name.is_some() {
            assignments.push(
                "search_text = string::lowercase(string::trim(\
                 string::concat($phone ?? phone, ' ', $name ?? name ?? '')))",
            );
        }
        assignments.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('guest', $id) SET {} WHERE tenant_id = $tenant_id",
            assignments.join(", ")
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("phone", phone))
            .bind(("name", input.name))
            .bind(("birthday", format_birthday(input.birthday)))
            .bind(("preferences", input.preferences))
            .bind(("messenger_id", input.messenger_id))
            .await
            .map_err(DbError::from)?;

        checked(result, "guest")?;

        Ok(self.fetch_one(tenant_id, id).await?)
    }

    async fn search(
        &self,
        tenant_id: Uuid,
        term: Option<&str>,
        pagination: Pagination,
    ) -> GuestflowResult<PaginatedResult<Guest>> {
        let term = term
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let filter = if term.is_some() {
            "tenant_id = $tenant_id AND string::contains(search_text, $term)"
        } else {
            "tenant_id = $tenant_id"
        };

        let count_query = format!("SELECT count() AS total FROM guest WHERE {filter} GROUP ALL");
        let mut builder = self
            .db
            .query(&count_query)
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(term) = &term {
            builder = builder.bind(("term", term.clone()));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM guest \
             WHERE {filter} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(&query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(term) = term {
            builder = builder.bind(("term", term));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<GuestRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_guest())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
