//! The three HTTP routes this service exposes: intake, a debug listing, and a
//! liveness probe. Intake takes the full `Request` rather than an extractor
//! tuple so the event hash is always computed over the exact bytes received,
//! never a re-serialized or partially-parsed form. Everything read off the
//! request is assembled into one `IncomingEvent` before it reaches the
//! authenticator or deduplicator, matching the fixed intake order: read body,
//! resolve `eventType` best-effort, then authenticate, then dedup.

use http_body_util::BodyExt;
use serde_json::Value;

use crate::{
    app::AppState,
    domain::{IncomingEvent, IngestResponse},
    error::ForwarderError,
    extractors::{FromRequest, ipaddr::IpAddr, state::State},
    repository::StoreOutcome,
    responder::Responder,
    types::{Request, Response},
};

const SIGNATURE_HEADERS: [&str; 3] =
    ["x-alchemy-signature", "x-signature", "x-hub-signature-256"];

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn ingest_alchemy(req: Request) -> Response {
    let Some(state) = crate::state::get_state::<AppState>() else {
        return ForwarderError::Store("application state not initialized".into()).into_response();
    };

    match handle_ingest(&state, "alchemy", req).await {
        Ok(body) => json_ok(&body),
        Err(err) => err.into_response(),
    }
}

async fn handle_ingest(
    state: &AppState,
    provider: &str,
    mut req: Request,
) -> Result<IngestResponse, ForwarderError> {
    let received_at = chrono::Utc::now();

    // Prefer a forwarding header (this service typically sits behind a load
    // balancer); fall back to the raw TCP peer address when none is present.
    let source_address = match IpAddr::from_request(&mut req).await {
        Ok(ip) => Some(ip.inner()),
        Err(_) => req.extensions().get::<std::net::SocketAddr>().map(|a| a.ip()),
    };

    let signature = SIGNATURE_HEADERS.iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let headers: serde_json::Map<String, Value> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::String(value.to_str().unwrap_or("").to_string()),
            )
        })
        .collect();

    let declared_len = req
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok());
    if let Some(len) = declared_len {
        if len > state.config.max_body_bytes {
            return Err(ForwarderError::BadInput(
                "request body exceeds the configured size limit".into(),
            ));
        }
    }

    let body = read_capped_body(req.into_body(), state.config.max_body_bytes).await?;

    if body.is_empty() {
        return Err(ForwarderError::BadInput("empty body".into()));
    }

    let parsed = serde_json::from_slice::<Value>(&body).ok();
    let event_type = parsed
        .as_ref()
        .and_then(|v| v.get("type"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    if parsed.is_none() {
        tracing::warn!(provider, "webhook body is not valid JSON; storing raw");
    }

    let event = IncomingEvent {
        provider: provider.to_string(),
        event_type,
        body,
        signature,
        source_address,
        received_at,
        headers: Value::Object(headers),
    };

    let auth = state.authenticator.authenticate(
        &state.config,
        &event.provider,
        &event.body,
        event.signature.as_deref(),
        event.source_address,
    );
    if !auth.authenticated {
        let reason = auth.failure_reason.unwrap_or_else(|| "unauthenticated".into());
        tracing::warn!(provider, reason = reason.as_str(), "webhook authentication failed");
        return Err(ForwarderError::Unauthenticated { reason });
    }

    let (is_duplicate, hash) = state
        .deduplicator
        .is_duplicate(&state.repository, &event.provider, &event.body)
        .await?;

    let hash_prefix = &hash[..12];
    if is_duplicate {
        tracing::info!(provider, hash_prefix, outcome = "duplicate", "webhook received");
        return Ok(IngestResponse::duplicate());
    }

    let event_data = parsed.unwrap_or_else(|| {
        Value::String(String::from_utf8_lossy(&event.body).into_owned())
    });

    let repository = state.repository.clone();
    let cancel = tokio_util::sync::CancellationToken::new();
    let outcome = state
        .retry
        .execute(&cancel, || {
            let repository = repository.clone();
            let provider = event.provider.clone();
            let event_type = event.event_type.clone();
            let event_data = event_data.clone();
            let hash = hash.clone();
            let headers_value = event.headers.clone();
            async move {
                repository
                    .store(
                        &provider,
                        &event_type,
                        &event_data,
                        &hash,
                        received_at,
                        source_address,
                        &headers_value,
                    )
                    .await
            }
        })
        .await?;

    match outcome {
        StoreOutcome::Inserted(event_id) => {
            tracing::info!(provider, hash_prefix, outcome = "stored", "webhook received");
            Ok(IngestResponse::stored(event_id))
        }
        StoreOutcome::AlreadyExists => {
            tracing::info!(provider, hash_prefix, outcome = "duplicate", "webhook received");
            Ok(IngestResponse::duplicate())
        }
    }
}

/// Reads the body under a hard byte cap regardless of whether `Content-Length`
/// was present, so a chunked request without that header can't bypass the
/// size limit the way a Content-Length-only check would allow.
async fn read_capped_body(
    body: hyper::body::Incoming,
    cap: usize,
) -> Result<bytes::Bytes, ForwarderError> {
    let mut body = body;
    let mut buf = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| ForwarderError::BadInput(format!("failed to read body: {e}")))?;
        if let Some(data) = frame.data_ref() {
            if buf.len() + data.len() > cap {
                return Err(ForwarderError::BadInput(
                    "request body exceeds the configured size limit".into(),
                ));
            }
            buf.extend_from_slice(data);
        }
    }

    Ok(bytes::Bytes::from(buf))
}

pub async fn list_events(State(state): State<AppState>) -> Response {
    match state.repository.recent_events().await {
        Ok(events) => json_ok(&events),
        Err(err) => err.into_response(),
    }
}

fn json_ok<T: serde::Serialize>(value: &T) -> Response {
    let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    json_response(http::StatusCode::OK, body)
}

fn json_response(status: http::StatusCode, body: String) -> Response {
    let mut response = http::Response::new(crate::body::TakoBody::new(http_body_util::Full::from(
        bytes::Bytes::from(body),
    )));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());
    response
}
