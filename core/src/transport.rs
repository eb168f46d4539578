//! The transport seam and its ureq-backed default.
//!
//! # Design
//! A [`Transport`] performs one round trip for an [`OutboundRequest`] and
//! returns the response with its body unread. Connection pooling, keep-alive
//! and TLS live behind it. Builders hold an `Arc<dyn Transport>`, so tests
//! substitute their own and proxies are applied by swapping the transport
//! of a single chain rather than mutating a process-wide one.
//!
//! [`shared`] hands out the process-wide [`UreqTransport`], built on first
//! use from [`TransportConfig::default`] and never torn down.

use std::{
    fmt, io,
    sync::{Arc, LazyLock},
};

use thiserror::Error;
use tracing::{trace, warn};
use ureq::http;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{BoxError, ConfigError};
use crate::execute::ExecutionScope;
use crate::http::{OutboundRequest, RawResponse};

/// Failure of a single dispatch.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The scope's deadline passed before a response arrived.
    #[error("deadline exceeded")]
    Timeout,

    #[error(transparent)]
    Failed(BoxError),
}

pub trait Transport: Send + Sync + fmt::Debug {
    /// Dispatch `request`, giving up once `scope` expires.
    ///
    /// Any status code the server answers with is a success here.
    fn send(
        &self,
        request: OutboundRequest,
        scope: &ExecutionScope,
    ) -> Result<RawResponse, TransportError>;

    /// A transport that routes through `proxy`.
    ///
    /// Transports without a proxy hook keep the default, which reports
    /// [`ConfigError::NoTransportSupport`].
    fn proxied(&self, proxy: &Url) -> Result<Arc<dyn Transport>, ConfigError> {
        let _ = proxy;
        Err(ConfigError::NoTransportSupport)
    }
}

static SHARED: LazyLock<Arc<dyn Transport>> =
    LazyLock::new(|| Arc::new(UreqTransport::new(TransportConfig::default())));

/// The process-wide transport used by the free constructors.
pub fn shared() -> Arc<dyn Transport> {
    Arc::clone(&SHARED)
}

/// Blocking transport on a pooled `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    config: TransportConfig,
    proxy: Option<String>,
}

impl UreqTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: TransportConfig, proxy: Option<(String, ureq::Proxy)>) -> Self {
        if config.danger_accept_invalid_certs {
            warn!("TLS certificate verification is disabled for this transport");
        }
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(config.danger_accept_invalid_certs)
            .build();
        let (proxy_url, proxy) = match proxy {
            Some((url, proxy)) => (Some(url), Some(proxy)),
            None => (None, None),
        };
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .max_idle_age(config.idle_timeout)
            .timeout_connect(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .tls_config(tls)
            .proxy(proxy)
            .build()
            .new_agent();
        Self {
            agent,
            config,
            proxy: proxy_url,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The proxy this transport routes through, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    fn run<S: ureq::AsSendBody>(
        &self,
        request: http::Request<S>,
        scope: &ExecutionScope,
    ) -> Result<http::Response<ureq::Body>, TransportError> {
        let request = self
            .agent
            .configure_request(request)
            .timeout_global(scope.remaining())
            .build();
        self.agent.run(request).map_err(classify)
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: OutboundRequest,
        scope: &ExecutionScope,
    ) -> Result<RawResponse, TransportError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = http::Request::builder()
            .method(method.as_str())
            .uri(url.as_str());
        for (key, value) in &headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        // An empty body goes out as no body at all.
        let response = if body.is_empty() {
            self.run(builder.body(()).map_err(failed)?, scope)?
        } else {
            self.run(builder.body(body).map_err(failed)?, scope)?
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        trace!(status, "response head received");

        Ok(RawResponse {
            status,
            headers,
            body: Box::new(response.into_body().into_reader()),
        })
    }

    /// HTTP proxies are always reached through a `CONNECT` tunnel, plain
    /// `http://` targets included. Proxies that only allow `CONNECT` to TLS
    /// ports reject those targets.
    fn proxied(&self, proxy: &Url) -> Result<Arc<dyn Transport>, ConfigError> {
        let url = proxy.as_str().to_string();
        let proxy =
            ureq::Proxy::new(&url).map_err(|e| ConfigError::InvalidProxy(e.to_string()))?;
        Ok(Arc::new(Self::build(self.config.clone(), Some((url, proxy)))))
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => TransportError::Timeout,
        other => TransportError::Failed(Box::new(other)),
    }
}

fn failed(err: http::Error) -> TransportError {
    TransportError::Failed(Box::new(err))
}
