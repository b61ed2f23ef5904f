//! Postgres-backed event storage.
//!
//! The uniqueness constraint on `(provider, event_hash)` is the actual source
//! of truth for deduplication; everything upstream of this module is a hint.
//! `store` leans on `ON CONFLICT ... DO NOTHING RETURNING id` so a racing
//! duplicate insert is resolved by Postgres itself — there's no uniqueness
//! error to catch and no retry to suppress for it.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::{StoredEventRow, StoredEventView},
    error::ForwarderError,
};

const EVENTS_LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy)]
pub enum StoreOutcome {
    Inserted(Uuid),
    AlreadyExists,
}

pub struct EventRepository {
    pool: sqlx::PgPool,
}

impl EventRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn store(
        &self,
        provider: &str,
        event_type: &str,
        event_data: &Value,
        event_hash: &str,
        received_at: DateTime<Utc>,
        source_address: Option<IpAddr>,
        headers: &Value,
    ) -> Result<StoreOutcome, ForwarderError> {
        let id = Uuid::new_v4();

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO forwarder.raw_webhook_events
                (id, provider, event_type, event_data, event_hash, received_at, source_ip, headers)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (provider, event_hash) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(provider)
        .bind(event_type)
        .bind(event_data)
        .bind(event_hash)
        .bind(received_at)
        .bind(source_address)
        .bind(headers)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(match inserted {
            Some(id) => StoreOutcome::Inserted(id),
            None => StoreOutcome::AlreadyExists,
        })
    }

    pub async fn hash_exists(&self, hash: &str) -> Result<bool, ForwarderError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM forwarder.raw_webhook_events WHERE event_hash = $1)",
        )
        .bind(hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    pub async fn check_health(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    pub async fn recent_count(&self, since: DateTime<Utc>) -> Result<i64, ForwarderError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM forwarder.raw_webhook_events WHERE received_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    pub async fn recent_events(&self) -> Result<Vec<StoredEventView>, ForwarderError> {
        let rows: Vec<StoredEventRow> = sqlx::query_as(
            r#"
            SELECT id, provider, event_type, event_data, event_hash, received_at, source_ip, headers
            FROM forwarder.raw_webhook_events
            ORDER BY received_at DESC
            LIMIT $1
            "#,
        )
        .bind(EVENTS_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn classify(err: sqlx::Error) -> ForwarderError {
    if is_transient(&err) {
        ForwarderError::Transient(err.to_string())
    } else {
        ForwarderError::Store(err.to_string())
    }
}

/// Connection and pool-exhaustion failures are transient; everything else —
/// including a uniqueness violation, which `store`'s `ON CONFLICT` clause
/// should never actually surface as an error — is permanent.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| code.starts_with("08"))
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_transient() {
        let err = sqlx::Error::PoolTimedOut;
        assert!(is_transient(&err));
    }

    #[test]
    fn row_not_found_is_permanent() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_transient(&err));
    }
}
