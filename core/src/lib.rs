//! Blocking client for the PocketBase records API.
//!
//! # Overview
//! List records, fetch one, create one. Every call is a single synchronous
//! HTTP round trip; there is no retry, caching or session state.
//!
//! # Design
//! - `PocketbaseClient` holds only the base URL and hands out `Collection`
//!   handles.
//! - Each `Collection` operation splits into `build_*` (produces request) and
//!   `parse_*` (consumes response), with a convenience method that runs both
//!   through a caller-supplied `Transport`.
//! - Bodies are returned as raw JSON text; failures are typed `ApiError`s.
//! - Diagnostics go through `tracing`; the host decides where they land by
//!   installing a subscriber, or installs none.

pub mod client;
pub mod collection;
pub mod error;
pub mod http;
mod query;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::PocketbaseClient;
pub use collection::Collection;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{CreateParams, ListPage, ListParams, RecordParams};

/// Collapse a result to the body text, or to `""` on any failure.
///
/// The error is logged at debug level before it is dropped; the operation
/// that produced it has already warned. For hosts that only understand an
/// empty-string sentinel.
pub fn into_sentinel(result: Result<String, ApiError>) -> String {
    match result {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "request failed");
            String::new()
        }
    }
}
