//! SurrealDB implementation of [`StaffRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! Every staff row lives in a `scope`: the owning tenant's id, or the
//! reserved [`PLATFORM_SCOPE`] for the platform operator. Email is
//! unique per scope.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use guestflow_core::error::GuestflowResult;
use guestflow_core::models::staff::{CreateStaff, StaffRole, StaffUser, UpdateStaff};
use guestflow_core::repository::{PaginatedResult, Pagination, StaffRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, checked, parse_uuid};
use crate::error::DbError;

/// Scope value of staff rows that belong to no tenant.
pub const PLATFORM_SCOPE: &str = "platform";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct StaffRow {
    scope: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct StaffRowWithId {
    record_id: String,
    scope: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn scope_of(tenant_id: Option<Uuid>) -> String {
    tenant_id.map_or_else(|| PLATFORM_SCOPE.to_string(), |id| id.to_string())
}

fn parse_scope(scope: &str) -> Result<Option<Uuid>, DbError> {
    if scope == PLATFORM_SCOPE {
        return Ok(None);
    }
    parse_uuid("tenant", scope).map(Some)
}

fn parse_role(s: &str) -> Result<StaffRole, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown staff role: {s}")))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl StaffRow {
    fn into_staff(self, id: Uuid) -> Result<StaffUser, DbError> {
        Ok(StaffUser {
            id,
            tenant_id: parse_scope(&self.scope)?,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StaffRowWithId {
    fn try_into_staff(self) -> Result<StaffUser, DbError> {
        Ok(StaffUser {
            id: parse_uuid("staff", &self.record_id)?,
            tenant_id: parse_scope(&self.scope)?,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Decode(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Decode(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the Staff repository.
pub struct SurrealStaffRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> Clone for SurrealStaffRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            pepper: self.pepper.clone(),
        }
    }
}

impl<C: Connection> SurrealStaffRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    /// Whether `email` is taken in `scope` by a record other than `except`.
    async fn email_taken(
        &self,
        scope: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM staff \
                 WHERE scope = $scope AND email = $email \
                 AND meta::id(id) != $except GROUP ALL",
            )
            .bind(("scope", scope.to_string()))
            .bind(("email", email.to_string()))
            .bind(("except", except.map(|id| id.to_string()).unwrap_or_default()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().is_some_and(|r| r.total > 0))
    }
}

impl<C: Connection> StaffRepository for SurrealStaffRepository<C> {
    async fn create(&self, input: CreateStaff) -> GuestflowResult<StaffUser> {
        input.validate()?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let scope = scope_of(input.tenant_id);
        let email = normalize_email(&input.email);

        if self.email_taken(&scope, &email, None).await? {
            return Err(DbError::Duplicate {
                entity: "staff".into(),
                reason: format!("email {email} already exists"),
            }
            .into());
        }

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('staff', $id) SET \
                 scope = $scope, email = $email, \
                 password_hash = $password_hash, \
                 role = $role, is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("scope", scope))
            .bind(("email", email))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = checked(result, "staff")?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff".into(),
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> GuestflowResult<StaffUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('staff', $id) \
                 WHERE scope = $scope",
            )
            .bind(("id", id_str.clone()))
            .bind(("scope", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff".into(),
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn get_identity(&self, id: Uuid) -> GuestflowResult<StaffUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('staff', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff".into(),
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn get_by_email(&self, tenant_id: Option<Uuid>, email: &str) -> GuestflowResult<StaffUser> {
        let email = normalize_email(email);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff \
                 WHERE scope = $scope AND email = $email",
            )
            .bind(("scope", scope_of(tenant_id)))
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_staff()?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateStaff) -> GuestflowResult<StaffUser> {
        input.validate()?;
        let id_str = id.to_string();
        let scope = tenant_id.to_string();
        let email = input.email.as_deref().map(normalize_email);

        if let Some(email) = &email {
            if self.email_taken(&scope, email, Some(id)).await? {
                return Err(DbError::Duplicate {
                    entity: "staff".into(),
                    reason: format!("email {email} already exists"),
                }
                .into());
            }
        }

        let mut sets = Vec::new();
        if email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('staff', $id) SET {} \
             WHERE scope = $scope",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("scope", scope));

        if let Some(email) = email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = checked(result, "staff")?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff".into(),
            id: id_str,
        })?;

        Ok(row.into_staff(id)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> GuestflowResult<PaginatedResult<StaffUser>> {
        let scope = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM staff \
                 WHERE scope = $scope GROUP ALL",
            )
            .bind(("scope", scope.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff \
                 WHERE scope = $scope \
                 ORDER BY email ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("scope", scope))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_staff())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
