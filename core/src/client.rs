//! The fluent request builder.
//!
//! # Design
//! `RequestBuilder` is a plain value. Every `with_*` method consumes the
//! snapshot, applies one change and returns the result; keeping a base and
//! cloning it is how variants are fanned out, and no variant can observe
//! another's changes. Configuration never fails mid-chain: the first
//! [`ConfigError`] is stored on the snapshot, carried through every later
//! call, and returned by [`RequestBuilder::execute`] before any I/O.

use std::{fmt, sync::Arc, time::Duration};

use serde::Serialize;
use tracing::warn;
use ureq::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::DEFAULT_TIMEOUT;
use crate::encoding::{BodyEncoder, Json, Xml};
use crate::error::{ConfigError, Result};
use crate::execute;
use crate::http::{HttpMethod, Response};
use crate::transport::Transport;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Immutable snapshot of a request under construction.
#[derive(Clone)]
pub struct RequestBuilder {
    transport: Arc<dyn Transport>,
    error: Option<ConfigError>,
    url: String,
    method: Option<HttpMethod>,
    headers: Vec<(String, String)>,
    query: String,
    body: Vec<u8>,
    timeout: Duration,
}

impl RequestBuilder {
    /// A builder with no method, `Accept: application/json`, an empty body
    /// and the default timeout.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            error: None,
            url: String::new(),
            method: None,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            query: String::new(),
            body: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Run this chain through another transport.
    pub fn with_transport(self, transport: Arc<dyn Transport>) -> Self {
        Self { transport, ..self }
    }

    /// Set the method from a verb (any case) and the target URL.
    pub fn with_method(self, method: &str, url: &str) -> Self {
        match method.parse::<HttpMethod>() {
            Ok(method) => self.target(method, url),
            Err(err) => Self {
                url: url.to_string(),
                ..self
            }
            .record(err),
        }
    }

    pub fn get(self, url: &str) -> Self {
        self.target(HttpMethod::Get, url)
    }

    pub fn post(self, url: &str) -> Self {
        self.target(HttpMethod::Post, url)
    }

    pub fn put(self, url: &str) -> Self {
        self.target(HttpMethod::Put, url)
    }

    pub fn delete(self, url: &str) -> Self {
        self.target(HttpMethod::Delete, url)
    }

    /// Set a header. An existing header with the same name, compared
    /// case-insensitively, is replaced; others are kept.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();

        if let Err(reason) = validate_header(&key, &value) {
            return self.record(ConfigError::InvalidHeader { name: key, reason });
        }

        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => *entry = (key, value),
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Bound the whole round trip. Zero is ignored and the previous value kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            return self;
        }
        Self { timeout, ..self }
    }

    /// Route this chain through an HTTP or SOCKS proxy.
    ///
    /// Only this snapshot and those derived from it use the proxy.
    pub fn with_proxy(self, proxy_url: &str) -> Self {
        let proxy = match Url::parse(proxy_url) {
            Ok(proxy) => proxy,
            Err(source) => {
                return self.record(ConfigError::InvalidUrl {
                    url: proxy_url.to_string(),
                    source,
                })
            }
        };
        match self.transport.proxied(&proxy) {
            Ok(transport) => Self { transport, ..self },
            Err(err) => self.record(err),
        }
    }

    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..self
        }
    }

    /// Encode `value` as the body and set the encoder's content type.
    ///
    /// On failure the error is stored and neither body nor header changes.
    pub fn with_encoded_body<E, T>(self, encoder: E, value: &T) -> Self
    where
        E: BodyEncoder,
        T: Serialize + ?Sized,
    {
        match encoder.encode(value) {
            Ok(bytes) => self
                .with_header("Content-Type", encoder.content_type())
                .with_body(bytes),
            Err(err) => self.record(err),
        }
    }

    pub fn with_json_body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.with_encoded_body(Json, value)
    }

    pub fn with_xml_body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.with_encoded_body(Xml, value)
    }

    /// Send `body` as an already encoded form.
    pub fn with_form_body(self, body: &str) -> Self {
        self.with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_body(body)
    }

    /// Set the raw query suffix. It is appended to the URL as given, so the
    /// caller supplies the leading `?` or `&` and any escaping.
    pub fn with_query(self, query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..self
        }
    }

    /// Perform the round trip.
    ///
    /// Any status the server answers with is `Ok`; see [`Response::ok`].
    pub fn execute(&self) -> Result<Response> {
        execute::execute(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The stored configuration error, if any.
    pub fn error(&self) -> Option<&ConfigError> {
        self.error.as_ref()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    fn target(self, method: HttpMethod, url: &str) -> Self {
        let next = Self {
            method: Some(method),
            url: url.to_string(),
            ..self
        };
        match Url::parse(url) {
            Ok(_) => next,
            Err(source) => next.record(ConfigError::InvalidUrl {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Keep the first error only.
    fn record(mut self, err: ConfigError) -> Self {
        if self.error.is_none() {
            warn!(error = %err, "request configuration failed, deferred to execute");
            self.error = Some(err);
        }
        self
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("timeout", &self.timeout)
            .field("error", &self.error)
            .field("transport", &self.transport)
            .finish()
    }
}

fn validate_header(key: &str, value: &str) -> std::result::Result<(), String> {
    HeaderName::from_bytes(key.as_bytes()).map_err(|e| e.to_string())?;
    HeaderValue::from_str(value).map_err(|e| e.to_string())?;
    Ok(())
}
