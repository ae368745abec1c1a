//! SurrealDB implementation of [`TableRepository`].

use chrono::{DateTime, Utc};
use guestflow_core::error::GuestflowResult;
use guestflow_core::models::table::{CreateTable, DiningTable, UpdateTable};
use guestflow_core::repository::TableRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::support::{checked, parse_uuid, settle};
use crate::error::DbError;

/// Detaches every booking from the table, then removes the table, in
/// one transaction.
const DELETE_TABLE_TX: &str = "\
BEGIN TRANSACTION;
LET $found = (SELECT VALUE meta::id(id) FROM type::record('dining_table', $id) \
    WHERE tenant_id = $tenant_id);
IF array::len($found) = 0 { THROW string::concat('gf:not_found:table:', $id) };
UPDATE booking SET table_id = NONE, updated_at = time::now() \
    WHERE tenant_id = $tenant_id AND table_id = $id;
DELETE type::record('dining_table', $id);
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct TableRow {
    tenant_id: String,
    name: String,
    capacity: Option<u32>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TableRow {
    fn try_into_table(self, id: Uuid) -> Result<DiningTable, DbError> {
        Ok(DiningTable {
            id,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            name: self.name,
            capacity: self.capacity,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct TableRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    capacity: Option<u32>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TableRowWithId {
    fn try_into_table(self) -> Result<DiningTable, DbError> {
        Ok(DiningTable {
            id: parse_uuid("table", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            name: self.name,
            capacity: self.capacity,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Table repository.
#[derive(Clone)]
pub struct SurrealTableRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTableRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TableRepository for SurrealTableRepository<C> {
    async fn create(&self, input: CreateTable) -> GuestflowResult<DiningTable> {
        input.validate()?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('dining_table', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 capacity = $capacity, sort_order = $sort_order",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("capacity", input.capacity))
            .bind(("sort_order", input.sort_order))
            .await
            .map_err(DbError::from)?;

        let mut result = checked(result, "table")?;

        let rows: Vec<TableRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "table".into(),
            id: id_str,
        })?;

        Ok(row.try_into_table(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> GuestflowResult<DiningTable> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('dining_table', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TableRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "table".into(),
            id: id_str,
        })?;

        Ok(row.try_into_table(id)?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateTable,
    ) -> GuestflowResult<DiningTable> {
        input.validate()?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.capacity.is_some() {
            sets.push("capacity = $capacity");
        }
        if input.sort_order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('dining_table', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(capacity) = input.capacity {
            builder = builder.bind(("capacity", capacity));
        }
        if let Some(sort_order) = input.sort_order {
            builder = builder.bind(("sort_order", sort_order));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = checked(result, "table")?;

        let rows: Vec<TableRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "table".into(),
            id: id_str,
        })?;

        Ok(row.try_into_table(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> GuestflowResult<()> {
        let result = self
            .db
            .query(DELETE_TABLE_TX)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        settle(result, "table")?;
        debug!(%tenant_id, table_id = %id, "Table deleted");
        Ok(())
    }

    async fn list(&self, tenant_id: Uuid) -> GuestflowResult<Vec<DiningTable>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM dining_table \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY sort_order ASC, name ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TableRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_table())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
