/// Integration tests for the reqwest transport against a local axum server
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use formflow::{
    AlertKind, FormPipeline, FormflowConfig, HttpTransport, Payload, SubmitOutcome,
    SubmitRequest, Transport, TransportError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Received {
    calls: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn accept(State(received): State<Received>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    received.calls.lock().unwrap().push((headers, body));
    Json(json!({ "success": true, "id": 7 }))
}

async fn reject(Json(_body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": false, "message": "duplicate" }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_json() -> &'static str {
    "<html>thanks</html>"
}

async fn spawn_server() -> (SocketAddr, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/api/contact", post(accept))
        .route("/api/reject", post(reject))
        .route("/api/broken", post(broken))
        .route("/api/html", post(not_json))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, received)
}

fn request(url: &str, method: &str) -> SubmitRequest {
    let mut payload = Payload::new();
    payload.insert("email".into(), "user@example.com".into());
    payload.insert("message".into(), "hi".into());
    SubmitRequest {
        url: url.to_string(),
        method: method.to_string(),
        payload,
    }
}

#[tokio::test]
async fn test_posts_json_with_ajax_header() {
    let (addr, received) = spawn_server().await;
    let transport = HttpTransport::new(Some(&format!("http://{addr}/contact.html"))).unwrap();

    let reply = transport.send(&request("/api/contact", "POST")).await.unwrap();

    assert!(reply.success);
    assert_eq!(reply.body["id"], 7);

    let calls = received.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (headers, body) = &calls[0];
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
    assert_eq!(body, &json!({ "email": "user@example.com", "message": "hi" }));
}

#[tokio::test]
async fn test_absolute_action_needs_no_base() {
    let (addr, received) = spawn_server().await;
    let transport = HttpTransport::new(None).unwrap();

    let reply = transport
        .send(&request(&format!("http://{addr}/api/contact"), "POST"))
        .await
        .unwrap();
    assert!(reply.success);
    assert_eq!(received.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejection_is_a_decoded_reply() {
    let (addr, _) = spawn_server().await;
    let transport = HttpTransport::new(Some(&format!("http://{addr}"))).unwrap();

    let reply = transport.send(&request("/api/reject", "POST")).await.unwrap();

    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("duplicate"));
}

#[tokio::test]
async fn test_error_status() {
    let (addr, _) = spawn_server().await;
    let transport = HttpTransport::new(Some(&format!("http://{addr}"))).unwrap();

    let err = transport.send(&request("/api/broken", "POST")).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 500, .. }));

    let err = transport.send(&request("/api/missing", "POST")).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_non_json_reply() {
    let (addr, _) = spawn_server().await;
    let transport = HttpTransport::new(Some(&format!("http://{addr}"))).unwrap();

    let err = transport.send(&request("/api/html", "POST")).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn test_request_errors() {
    let transport = HttpTransport::new(None).unwrap();

    let err = transport.send(&request("/api/contact", "POST")).await.unwrap_err();
    assert!(matches!(err, TransportError::Request(_)));

    let err = transport
        .send(&request("http://127.0.0.1:1/api/contact", "GET"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Request(_)));

    assert!(HttpTransport::new(Some("not a url")).is_err());
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(None).unwrap();
    let err = transport
        .send(&request(&format!("http://{addr}/api/contact"), "POST"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn test_pipeline_over_http() {
    let (addr, received) = spawn_server().await;
    let markup = r#"
        <form id="contact" data-form action="/api/contact" method="post">
          <input name="email" type="email" required>
          <button type="submit">Send</button>
        </form>
        <form id="dupe" data-form action="/api/reject" method="post">
          <input name="email" type="email" required>
        </form>
    "#;
    let transport = HttpTransport::new(Some(&format!("http://{addr}/"))).unwrap();
    let pipeline = FormPipeline::from_html(markup, Arc::new(transport), FormflowConfig::default()).unwrap();
    pipeline.discover().await;
    let mut alerts = pipeline.subscribe();

    pipeline.input("contact", "email", "user@example.com").await.unwrap();
    assert!(pipeline.submit("contact").await.unwrap().is_success());
    assert_eq!(received.calls.lock().unwrap().len(), 1);
    assert_eq!(alerts.recv().await.unwrap().kind, AlertKind::Success);

    pipeline.input("dupe", "email", "user@example.com").await.unwrap();
    assert!(matches!(pipeline.submit("dupe").await.unwrap(), SubmitOutcome::Failed(_)));
    let alert = alerts.recv().await.unwrap();
    assert_eq!(alert.kind, AlertKind::Error);
    assert_eq!(alert.message, "duplicate");
}
