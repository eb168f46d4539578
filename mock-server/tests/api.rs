use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Recorder};
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .header("x-trace", "abc")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_returns_request_body() {
    let recorder = Recorder::new();
    let resp = app(recorder.clone())
        .oneshot(request("POST", "/echo", "hello world"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    assert_eq!(body_bytes(resp).await.as_ref(), b"hello world");
}

#[tokio::test]
async fn echo_records_method_headers_and_query() {
    let recorder = Recorder::new();
    app(recorder.clone())
        .oneshot(request("PUT", "/echo?a=1&b=2", "payload"))
        .await
        .unwrap();

    let recorded = recorder.last().unwrap();
    assert_eq!(recorded.method, "PUT");
    assert_eq!(recorded.path, "/echo");
    assert_eq!(recorded.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(recorded.header("X-Trace"), Some("abc"));
    assert_eq!(recorded.body, b"payload");
}

// --- status ---

#[tokio::test]
async fn status_route_answers_with_requested_code() {
    for code in [200u16, 201, 404, 500] {
        let resp = app(Recorder::new())
            .oneshot(request("GET", &format!("/status/{code}"), ""))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
        assert_eq!(body_bytes(resp).await, format!("status {code}"));
    }
}

#[tokio::test]
async fn status_304_has_empty_body() {
    let resp = app(Recorder::new())
        .oneshot(request("GET", "/status/304", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_out_of_range_is_bad_request() {
    let resp = app(Recorder::new())
        .oneshot(request("GET", "/status/42", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- sleep / bytes ---

#[tokio::test]
async fn sleep_route_eventually_answers() {
    let resp = app(Recorder::new())
        .oneshot(request("GET", "/sleep/10", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), b"slept");
}

#[tokio::test]
async fn bytes_route_returns_requested_length() {
    let resp = app(Recorder::new())
        .oneshot(request("GET", "/bytes/4096", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(body.len(), 4096);
    assert!(body.iter().all(|b| *b == b'x'));
}

// --- fallback ---

#[tokio::test]
async fn unknown_route_is_recorded_and_404() {
    let recorder = Recorder::new();
    let resp = app(recorder.clone())
        .oneshot(request("DELETE", "/nothing/here", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.last().unwrap().method, "DELETE");
}

// --- shared recorder across calls ---

#[tokio::test]
async fn recorder_accumulates_across_requests() {
    use tower::Service;

    let recorder = Recorder::new();
    let mut svc = app(recorder.clone()).into_service();

    for path in ["/echo", "/status/201", "/bytes/3"] {
        let resp = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call(request("GET", path, ""))
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    let paths: Vec<String> = recorder.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/echo", "/status/201", "/bytes/3"]);
}

// --- peer address ---

#[tokio::test]
async fn peer_is_recorded_from_connect_info() {
    use axum::extract::connect_info::MockConnectInfo;
    use std::net::SocketAddr;

    let recorder = Recorder::new();
    let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let resp = app(recorder.clone())
        .layer(MockConnectInfo(peer))
        .oneshot(request("GET", "/echo", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(recorder.last().unwrap().peer, Some(peer));
}

#[tokio::test]
async fn peer_is_none_without_connect_info() {
    let recorder = Recorder::new();
    app(recorder.clone())
        .oneshot(request("GET", "/echo", ""))
        .await
        .unwrap();

    assert_eq!(recorder.last().unwrap().peer, None);
}
