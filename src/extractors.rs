//! HTTP request data extraction utilities and traits.
//!
//! This module provides a small extraction system for pulling data out of HTTP
//! requests in a type-safe way. `FromRequest` is for extractors that need the full
//! request (including body); `FromRequestParts` is for extractors that only need
//! request metadata.

use http::request::Parts;

/// Raw byte data extraction from request bodies.
pub mod bytes;

/// HTTP header map extraction.
pub mod header_map;

/// Client IP address extraction from request headers.
pub mod ipaddr;

/// Global state extraction (`State<T>`).
pub mod state;

/// Trait for extracting data from complete HTTP requests.
pub trait FromRequest<'a>: Sized {
  /// Error type returned when extraction fails.
  type Error: crate::responder::Responder;

  /// Extracts the type from the HTTP request.
  fn from_request(
    req: &'a mut crate::types::Request,
  ) -> impl core::future::Future<Output = core::result::Result<Self, Self::Error>> + Send + 'a;
}

/// Trait for extracting data from HTTP request parts (metadata only).
pub trait FromRequestParts<'a>: Sized {
  /// Error type returned when extraction fails.
  type Error: crate::responder::Responder;

  /// Extracts the type from the HTTP request parts.
  fn from_request_parts(
    parts: &'a mut Parts,
  ) -> impl core::future::Future<Output = core::result::Result<Self, Self::Error>> + Send + 'a;
}

// Built-in extractor for borrowing the request itself in handlers: `&mut Request`.
impl<'a> FromRequest<'a> for &'a mut crate::types::Request {
  type Error = core::convert::Infallible;

  fn from_request(
    req: &'a mut crate::types::Request,
  ) -> impl core::future::Future<Output = core::result::Result<Self, Self::Error>> + Send + 'a {
    std::future::ready(Ok(req))
  }
}
