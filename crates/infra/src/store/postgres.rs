//! Postgres-backed conference store.
//!
//! One row per conference: the aggregate as a JSONB document, plus the name
//! and version as real columns so the unique index and the optimistic check
//! run inside the database.
//!
//! ## Error Mapping
//!
//! | SQLx error | Code | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `DuplicateKey` |
//! | Database (other) | any | `Unavailable` |
//! | PoolClosed / Io / other | n/a | `Unavailable` |

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;

use boxoffice_booking::Conference;
use boxoffice_core::{ConferenceId, ExpectedVersion};

use super::{ConferenceFilter, ConferenceStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conferences (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    version     BIGINT NOT NULL CHECK (version > 0),
    document    JSONB NOT NULL,
    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE UNIQUE INDEX IF NOT EXISTS conferences_name_key ON conferences (name);
"#;

#[derive(Debug, Clone)]
pub struct PostgresConferenceStore {
    pool: PgPool,
}

impl PostgresConferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the table and unique name index if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn current_version(&self, id: ConferenceId) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT version FROM conferences WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("current_version", e))?;

        row.map(|r| r.try_get::<i64, _>("version").map(to_version))
            .transpose()
            .map_err(|e| map_sqlx_error("current_version", e))
    }
}

fn to_version(v: i64) -> u64 {
    u64::try_from(v).unwrap_or_default()
}

fn to_db_version(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Conference, StoreError> {
    let document: serde_json::Value = row
        .try_get("document")
        .map_err(|e| map_sqlx_error("decode_document", e))?;
    let version: i64 = row
        .try_get("version")
        .map_err(|e| map_sqlx_error("decode_version", e))?;

    let conference: Conference = serde_json::from_value(document)
        .map_err(|e| StoreError::Unavailable(format!("corrupt conference document: {e}")))?;
    Ok(conference.with_version(to_version(version)))
}

fn encode(conference: &Conference) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(conference)
        .map_err(|e| StoreError::Unavailable(format!("failed to encode conference: {e}")))
}

#[async_trait]
impl ConferenceStore for PostgresConferenceStore {
    #[instrument(skip(self), fields(conference_id = %id), err)]
    async fn fetch_one(&self, id: ConferenceId) -> Result<Conference, StoreError> {
        let row = sqlx::query("SELECT document, version FROM conferences WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_one", e))?
            .ok_or(StoreError::NotFound(id))?;

        decode_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn fetch_many(&self, filter: &ConferenceFilter) -> Result<Vec<Conference>, StoreError> {
        let rows = match filter {
            ConferenceFilter::All => {
                sqlx::query(
                    "SELECT document, version FROM conferences ORDER BY inserted_at ASC, id ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
            ConferenceFilter::Name(name) => {
                sqlx::query(
                    "SELECT document, version FROM conferences WHERE name = $1 ORDER BY inserted_at ASC, id ASC",
                )
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("fetch_many", e))?;

        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, conference), fields(conference_id = %conference.id_typed()), err)]
    async fn insert_one(&self, conference: Conference) -> Result<Conference, StoreError> {
        let stored = conference.with_version(1);
        let document = encode(&stored)?;

        sqlx::query(
            r#"
            INSERT INTO conferences (id, name, version, document)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(stored.id_typed().as_uuid())
        .bind(stored.name().as_str())
        .bind(1i64)
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateKey(stored.name().to_string())
            } else {
                map_sqlx_error("insert_one", e)
            }
        })?;

        Ok(stored)
    }

    #[instrument(skip(self, conference), fields(conference_id = %conference.id_typed(), expected = ?expected), err)]
    async fn replace_one(
        &self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError> {
        let id = conference.id_typed();
        let document = encode(&conference)?;

        // Single statement: the version predicate and the write are atomic.
        let row = sqlx::query(
            r#"
            UPDATE conferences
            SET name = $2, document = $3, version = version + 1
            WHERE id = $1 AND ($4::BIGINT IS NULL OR version = $4)
            RETURNING version
            "#,
        )
        .bind(id.as_uuid())
        .bind(conference.name().as_str())
        .bind(&document)
        .bind(expected.exact().map(to_db_version))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateKey(conference.name().to_string())
            } else {
                map_sqlx_error("replace_one", e)
            }
        })?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| map_sqlx_error("replace_one", e))?;
                Ok(conference.with_version(to_version(version)))
            }
            None => match self.current_version(id).await? {
                None => Err(StoreError::NotFound(id)),
                Some(actual) => Err(StoreError::Conflict {
                    conference_id: id,
                    expected,
                    actual,
                }),
            },
        }
    }

    #[instrument(skip(self), fields(conference_id = %id), err)]
    async fn delete_one(&self, id: ConferenceId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM conferences WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_one", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(conference_id = %id), err)]
    async fn sum_active_tickets(&self, id: ConferenceId) -> Result<u32, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM((b->>'tickets_booked')::BIGINT)
                       FILTER (WHERE NOT COALESCE((b->>'is_canceled')::BOOLEAN, FALSE)), 0)::BIGINT AS active
            FROM conferences c
            LEFT JOIN LATERAL jsonb_array_elements(c.document->'bookings') AS b ON TRUE
            WHERE c.id = $1
            GROUP BY c.id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sum_active_tickets", e))?
        .ok_or(StoreError::NotFound(id))?;

        let active: i64 = row
            .try_get("active")
            .map_err(|e| map_sqlx_error("sum_active_tickets", e))?;
        Ok(u32::try_from(active).unwrap_or(u32::MAX))
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::DuplicateKey(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
