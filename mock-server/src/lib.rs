//! Recording HTTP server used to exercise the request core over real sockets.
//!
//! Every request that reaches a route is captured into a shared [`Recorder`]
//! before the route answers, so tests can assert on exactly what went over
//! the wire and on how many requests were issued. The peer address of each
//! request identifies the connection it came in on.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{header, Extensions, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;

/// A request as observed by the server.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Client address, `None` when the router runs without connect info.
    pub peer: Option<SocketAddr>,
}

impl RecordedRequest {
    /// Case-insensitive header lookup. Returns every value sent for `name`.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }
}

/// Shared log of received requests.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last(&self) -> Option<RecordedRequest> {
        self.lock().last().cloned()
    }

    fn push(&self, request: RecordedRequest) {
        self.lock().push(request);
    }

    // A poisoned log is still a valid log.
    fn lock(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn app(recorder: Recorder) -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/sleep/{ms}", any(sleep))
        .route("/bytes/{n}", any(bytes))
        .fallback(not_found)
        .with_state(recorder)
}

pub async fn run(listener: TcpListener, recorder: Recorder) -> Result<(), std::io::Error> {
    axum::serve(
        listener,
        app(recorder).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

fn record(
    recorder: &Recorder,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    extensions: &Extensions,
    body: &Bytes,
) {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    tracing::debug!(%method, %uri, ?peer, "recorded request");
    recorder.push(RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
        peer,
    });
}

/// Replies with the request body, keeping its content type.
async fn echo(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    record(&recorder, &method, &uri, &headers, &extensions, &body);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn status(
    State(recorder): State<Recorder>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    record(&recorder, &method, &uri, &headers, &extensions, &body);
    match StatusCode::from_u16(code) {
        Ok(status) if status == StatusCode::NOT_MODIFIED || status == StatusCode::NO_CONTENT => {
            status.into_response()
        }
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid status code").into_response(),
    }
}

async fn sleep(
    State(recorder): State<Recorder>,
    Path(ms): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    record(&recorder, &method, &uri, &headers, &extensions, &body);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "slept".into_response()
}

async fn bytes(
    State(recorder): State<Recorder>,
    Path(n): Path<usize>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    record(&recorder, &method, &uri, &headers, &extensions, &body);
    vec![b'x'; n].into_response()
}

async fn not_found(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    record(&recorder, &method, &uri, &headers, &extensions, &body);
    StatusCode::NOT_FOUND.into_response()
}
