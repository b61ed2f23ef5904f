//! Error taxonomy for the ingestion pipeline.
//!
//! `Transient` never reaches the HTTP boundary: the retry policy absorbs it,
//! translating exhausted retries into `Store`. A duplicate event is not an
//! error at all — it's a distinguished `Ok` outcome of the repository.

use http::{StatusCode, header};
use thiserror::Error;

use crate::{body::TakoBody, responder::Responder};

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("{0}")]
    BadInput(String),

    #[error("{reason}")]
    Unauthenticated { reason: String },

    /// Absorbed by `RetryPolicy::execute`; only escapes as `Store` once
    /// retries are exhausted.
    #[error("transient store failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Store(String),
}

impl Responder for ForwarderError {
    fn into_response(self) -> http::Response<TakoBody> {
        let status = match &self {
            ForwarderError::BadInput(_) => StatusCode::BAD_REQUEST,
            ForwarderError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ForwarderError::Transient(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForwarderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "message": self.to_string() }).to_string();
        let mut response = http::Response::new(TakoBody::new(http_body_util::Full::from(
            bytes::Bytes::from(body),
        )));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        response
    }
}
