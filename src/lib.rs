//! Webhook ingestion layer for blockchain-provider event callbacks.
//!
//! This crate is split into a small in-tree HTTP framework (routing, extractors,
//! responses, middleware — originally a standalone project, trimmed here to the
//! surface this service drives) and the ingestion pipeline proper: intake,
//! authentication, deduplication, storage, and retry.
//!
//! # Compatibility
//! - Runtime: `tokio`
//! - HTTP: `hyper` 1.x
//! - Store: PostgreSQL via `sqlx`

/// HTTP request and response body handling utilities.
pub mod body;

/// Request data extraction utilities for parsing headers, state, and raw bytes.
pub mod extractors;

/// Request handler traits and implementations.
mod handler;

/// Middleware for processing requests and responses in a pipeline.
pub mod middleware;

/// Response generation utilities and traits.
pub mod responder;

/// Route definition and matching logic.
mod route;

/// Request routing and dispatch functionality.
pub mod router;

/// HTTP server implementation and configuration.
mod server;

/// Application state management and dependency injection.
pub mod state;

/// Structured logging setup.
pub mod tracing_setup;

/// Core type definitions used throughout the framework.
pub mod types;

/// Runtime configuration loaded from the process environment.
pub mod config;

/// Domain error types shared across the ingestion pipeline.
pub mod error;

/// `IncomingEvent` / `StoredEvent` domain types and wire DTOs.
pub mod domain;

/// HMAC-SHA256 webhook signature verification (component B).
pub mod auth;

/// Content-hash deduplication with a two-tier cache (component C).
pub mod dedup;

/// Postgres-backed event storage (component D).
pub mod repository;

/// Exponential-backoff retry policy (component E).
pub mod retry;

/// HTTP handlers wiring the pipeline together (component A).
pub mod handlers;

/// Shared application state assembled at startup.
pub mod app;

pub use bytes::Bytes;
pub use http::{Method, StatusCode, header};
pub use http_body_util::Full;

/// Starts the HTTP server with the given listener and router.
pub use server::serve;
