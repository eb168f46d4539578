//! Fluent HTTP request builder with a single-shot execution pipeline.
//!
//! # Overview
//! Chain configuration onto a [`RequestBuilder`] and finish with
//! [`RequestBuilder::execute`], which performs exactly one round trip and
//! returns a [`Response`] whose body is already read in full.
//!
//! ```no_run
//! let resp = request_core::post("https://api.example.com/items")
//!     .with_header("Authorization", "Bearer abc")
//!     .with_json_body(&serde_json::json!({ "name": "widget" }))
//!     .execute()?;
//! if resp.ok() {
//!     println!("{}", resp.text());
//! }
//! # Ok::<(), request_core::RequestError>(())
//! ```
//!
//! # Design
//! - Builders are values. Each `with_*` call returns a new snapshot, so a
//!   base builder can be cloned into independent variants.
//! - Configuration errors (bad URL, bad header, failed encoding, missing
//!   proxy support) are stored on the snapshot and returned by `execute`
//!   without any network activity. The first one wins.
//! - `execute` returns `Ok` for every HTTP status; [`Response::ok`] is true
//!   for 2xx and 304. Errors are configuration, [`RequestError::Timeout`],
//!   or the transport's own failure.
//! - The free constructors share one pooled [`UreqTransport`] (see
//!   [`transport::shared`]); [`RequestBuilder::new`] takes any [`Transport`].

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod execute;
pub mod http;
pub mod transport;

pub use client::RequestBuilder;
pub use config::{TransportConfig, DEFAULT_TIMEOUT};
pub use encoding::{BodyEncoder, Json, Xml};
pub use error::{BoxError, ConfigError, RequestError, Result};
pub use execute::ExecutionScope;
pub use http::{HttpMethod, OutboundRequest, RawResponse, Response};
pub use transport::{shared, Transport, TransportError, UreqTransport};

/// A builder on the shared transport with no method set yet.
pub fn new() -> RequestBuilder {
    RequestBuilder::new(transport::shared())
}

/// A builder for `verb url`; the verb is matched case-insensitively.
pub fn method(verb: &str, url: &str) -> RequestBuilder {
    new().with_method(verb, url)
}

pub fn get(url: &str) -> RequestBuilder {
    new().get(url)
}

pub fn post(url: &str) -> RequestBuilder {
    new().post(url)
}

pub fn put(url: &str) -> RequestBuilder {
    new().put(url)
}

pub fn delete(url: &str) -> RequestBuilder {
    new().delete(url)
}
