//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD timezone ON TABLE tenant TYPE string;
DEFINE FIELD contacts ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_name ON TABLE tenant COLUMNS name;

-- =======================================================================
-- Staff (tenant scope, or the reserved 'platform' scope)
-- =======================================================================
DEFINE TABLE staff SCHEMAFULL;
DEFINE FIELD scope ON TABLE staff TYPE string;
DEFINE FIELD email ON TABLE staff TYPE string;
DEFINE FIELD password_hash ON TABLE staff TYPE string;
DEFINE FIELD role ON TABLE staff TYPE string \
    ASSERT $value IN ['platform_operator', 'owner', 'admin', 'manager'];
DEFINE FIELD is_active ON TABLE staff TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE staff TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE staff TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_staff_scope_email ON TABLE staff \
    COLUMNS scope, email UNIQUE;

-- =======================================================================
-- Guests (tenant scope, merge key is the phone number)
-- =======================================================================
DEFINE TABLE guest SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE guest TYPE string;
DEFINE FIELD phone ON TABLE guest TYPE string;
DEFINE FIELD name ON TABLE guest TYPE option<string>;
DEFINE FIELD birthday ON TABLE guest TYPE option<string>;
DEFINE FIELD preferences ON TABLE guest TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD messenger_id ON TABLE guest TYPE option<int>;
DEFINE FIELD visit_count ON TABLE guest TYPE int DEFAULT 0;
DEFINE FIELD first_visit_at ON TABLE guest TYPE option<datetime>;
DEFINE FIELD last_visit_at ON TABLE guest TYPE option<datetime>;
DEFINE FIELD search_text ON TABLE guest TYPE string;
DEFINE FIELD created_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_guest_tenant_phone ON TABLE guest \
    COLUMNS tenant_id, phone UNIQUE;

-- =======================================================================
-- Dining tables (tenant scope)
-- =======================================================================
DEFINE TABLE dining_table SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE dining_table TYPE string;
DEFINE FIELD name ON TABLE dining_table TYPE string;
DEFINE FIELD capacity ON TABLE dining_table TYPE option<int>;
DEFINE FIELD sort_order ON TABLE dining_table TYPE int DEFAULT 0;
-- Bumped by every booking write that claims the table, so concurrent
-- claims on one table collide inside the store.
DEFINE FIELD slot_version ON TABLE dining_table TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE dining_table TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE dining_table TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_table_tenant_order ON TABLE dining_table \
    COLUMNS tenant_id, sort_order;

-- =======================================================================
-- Bookings (tenant scope, never deleted)
-- =======================================================================
DEFINE TABLE booking SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE booking TYPE string;
DEFINE FIELD guest_id ON TABLE booking TYPE string;
DEFINE FIELD table_id ON TABLE booking TYPE option<string>;
DEFINE FIELD booked_at ON TABLE booking TYPE datetime;
-- booked_at + duration_minutes + buffer_minutes
DEFINE FIELD occupied_until ON TABLE booking TYPE datetime;
DEFINE FIELD duration_minutes ON TABLE booking TYPE int \
    ASSERT $value > 0;
DEFINE FIELD buffer_minutes ON TABLE booking TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD party_size ON TABLE booking TYPE int ASSERT $value > 0;
DEFINE FIELD status ON TABLE booking TYPE string \
    ASSERT $value IN ['new', 'confirmed', 'arrived', 'completed', \
    'cancelled', 'no_show'];
DEFINE FIELD source ON TABLE booking TYPE string \
    ASSERT $value IN ['bot', 'manual', 'walk_in'];
DEFINE FIELD confirmed_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD arrived_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD completed_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD created_by ON TABLE booking TYPE option<string>;
DEFINE FIELD created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_tenant_time ON TABLE booking \
    COLUMNS tenant_id, booked_at;
DEFINE INDEX idx_booking_tenant_table ON TABLE booking \
    COLUMNS tenant_id, table_id;
DEFINE INDEX idx_booking_tenant_guest ON TABLE booking \
    COLUMNS tenant_id, guest_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(
            version = migration.version,
            "Migration applied successfully"
        );
    }

    Ok(())
}
