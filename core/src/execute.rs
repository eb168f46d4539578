//! The execution engine: one snapshot in, one round trip, one response out.
//!
//! # Design
//! `execute` walks a fixed sequence. A stored configuration error is
//! returned before anything else, so a broken chain never reaches the
//! network. Otherwise the effective URL is `url + query`, an
//! [`ExecutionScope`] bounds the round trip by the snapshot's timeout, and
//! the transport dispatches. The response body is read to the end and the
//! reader is drained and dropped on every path out, which is what lets the
//! transport put the connection back in its pool.

use std::{
    io::{self, Read},
    time::{Duration, Instant},
};

use tracing::{debug, debug_span, trace};
use uuid::Uuid;

use crate::client::RequestBuilder;
use crate::error::{ConfigError, RequestError, Result};
use crate::http::{OutboundRequest, RawResponse, Response};
use crate::transport::TransportError;

/// Time bound for a single execution.
///
/// Transports read [`ExecutionScope::remaining`] and give up once it hits
/// zero. The scope is released when execution returns, whatever the outcome.
#[derive(Debug)]
pub struct ExecutionScope {
    id: Uuid,
    started: Instant,
    deadline: Option<Instant>,
}

impl ExecutionScope {
    /// A zero timeout means unbounded.
    pub fn new(timeout: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            id: Uuid::new_v4(),
            started,
            deadline: timeout
                .filter(|t| !t.is_zero())
                .map(|t| started + t),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }
}

impl Drop for ExecutionScope {
    fn drop(&mut self) {
        trace!(id = %self.id, elapsed = ?self.elapsed(), "execution scope released");
    }
}

pub(crate) fn execute(request: &RequestBuilder) -> Result<Response> {
    if let Some(err) = request.error() {
        return Err(err.clone().into());
    }
    let method = request.method().ok_or(ConfigError::MissingMethod)?;
    let url = format!("{}{}", request.url(), request.query());

    let scope = ExecutionScope::new(Some(request.timeout()));
    let span = debug_span!("execute", id = %scope.id(), %method, %url);
    let _entered = span.enter();

    let outbound = OutboundRequest {
        method,
        url,
        headers: request.headers().to_vec(),
        body: request.body().to_vec(),
    };
    debug!(
        timeout = ?request.timeout(),
        body_len = outbound.body.len(),
        "dispatching request"
    );

    let RawResponse {
        status,
        headers,
        body,
    } = match request.transport().send(outbound, &scope) {
        Ok(raw) => raw,
        Err(TransportError::Timeout) => {
            debug!(elapsed = ?scope.elapsed(), "request timed out");
            return Err(RequestError::Timeout);
        }
        Err(TransportError::Failed(source)) => {
            debug!(error = %source, "transport failed");
            return Err(RequestError::Transport(source));
        }
    };

    let body = read_body(body, &scope)?;
    let response = Response::new(status, headers, body);
    debug!(
        status,
        ok = response.ok(),
        bytes = response.body().len(),
        elapsed = ?scope.elapsed(),
        "request completed"
    );
    Ok(response)
}

fn read_body(reader: Box<dyn Read>, scope: &ExecutionScope) -> Result<Vec<u8>> {
    let mut body = DrainOnDrop(reader);
    let mut buf = Vec::new();
    match body.0.read_to_end(&mut buf) {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::TimedOut || scope.is_expired() => {
            debug!(read = buf.len(), "response body timed out");
            Err(RequestError::Timeout)
        }
        Err(e) => Err(RequestError::Body(e)),
    }
}

/// Drains whatever is left of a body into a sink, then drops the reader.
struct DrainOnDrop(Box<dyn Read>);

impl Drop for DrainOnDrop {
    fn drop(&mut self) {
        match io::copy(&mut self.0, &mut io::sink()) {
            Ok(0) => {}
            Ok(n) => trace!(bytes = n, "drained unread response body"),
            Err(e) => trace!(error = %e, "draining response body failed"),
        }
    }
}
