//! Domain types: the request-scoped `IncomingEvent`, the persisted `StoredEvent`
//! row shape, and the wire DTOs the HTTP surface serializes.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A webhook call as captured at intake, before authentication or dedup.
///
/// Transient and request-scoped: built by the intake handler, consumed by the
/// authenticator and deduplicator, and folded into a `StoredEvent` on write.
pub struct IncomingEvent {
    pub provider: String,
    pub event_type: String,
    pub body: bytes::Bytes,
    pub signature: Option<String>,
    pub source_address: Option<IpAddr>,
    pub received_at: DateTime<Utc>,
    pub headers: Value,
}

/// The row shape persisted to `forwarder.raw_webhook_events`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredEventRow {
    pub id: Uuid,
    pub provider: String,
    pub event_type: String,
    pub event_data: Value,
    pub event_hash: String,
    pub received_at: DateTime<Utc>,
    pub source_ip: Option<IpAddr>,
    pub headers: Option<Value>,
}

/// The `POST /webhook/alchemy` response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    #[serde(rename = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    pub duplicate: bool,
}

impl IngestResponse {
    pub fn stored(event_id: Uuid) -> Self {
        Self { message: "Event stored", event_id: Some(event_id), duplicate: false }
    }

    pub fn duplicate() -> Self {
        Self { message: "Event already processed", event_id: None, duplicate: true }
    }
}

/// The `GET /webhook/alchemy/events` row shape; `source_ip` is serialized as a
/// plain string rather than a structured address per the bit-level contract.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEventView {
    pub id: Uuid,
    pub provider: String,
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "eventData")]
    pub event_data: Value,
    #[serde(rename = "eventHash")]
    pub event_hash: String,
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,
    #[serde(rename = "sourceAddress")]
    pub source_address: Option<String>,
    pub headers: Option<Value>,
}

impl From<StoredEventRow> for StoredEventView {
    fn from(row: StoredEventRow) -> Self {
        Self {
            id: row.id,
            provider: row.provider,
            event_type: row.event_type,
            event_data: row.event_data,
            event_hash: row.event_hash,
            received_at: row.received_at,
            source_address: row.source_ip.map(|ip| ip.to_string()),
            headers: row.headers,
        }
    }
}
