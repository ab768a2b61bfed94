//! End-to-end coverage of the renderer protocol client and the HTTP surface,
//! driven against an in-process stub renderer.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use plantbridge::{
    application::renderer::RendererClient,
    domain::{diagram::DiagramFormat, error::RenderError},
    infra::http::{AppState, build_router},
};
use tower::ServiceExt;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-png-artifact";
const SVG_BODY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
const CLEAN_TXT: &str = "     ,-----.\n     |Alice|\n     `-----'\n";
const SYNTAX_BODY: &str =
    "[From string (line 5) ]\n\n@startuml\nAlice => Bob\n Syntax error: expected '@enduml'";

/// Scripted renderer: answers the form/txt/{png,svg} protocol and records
/// what it was asked.
#[derive(Clone)]
struct StubRenderer {
    probe_status: StatusCode,
    probe_body: Bytes,
    submissions: Arc<Mutex<Vec<String>>>,
    format_fetches: Arc<AtomicUsize>,
}

impl StubRenderer {
    fn new(probe_status: StatusCode, probe_body: impl Into<Bytes>) -> Self {
        Self {
            probe_status,
            probe_body: probe_body.into(),
            submissions: Arc::new(Mutex::new(Vec::new())),
            format_fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn healthy() -> Self {
        Self::new(StatusCode::OK, CLEAN_TXT)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/form", post(submit))
            .route("/uml/{id}", get(|| async { "ok" }))
            .route("/txt/{id}", get(probe))
            .route("/png/{id}", get(png_artifact))
            .route("/svg/{id}", get(svg_artifact))
            .with_state(self.clone())
    }

    fn submissions(&self) -> Vec<String> {
        self.submissions.lock().expect("submissions lock").clone()
    }

    fn format_fetches(&self) -> usize {
        self.format_fetches.load(Ordering::SeqCst)
    }
}

async fn submit(
    State(stub): State<StubRenderer>,
    Form(fields): Form<HashMap<String, String>>,
) -> Redirect {
    stub.submissions
        .lock()
        .expect("submissions lock")
        .push(fields.get("text").cloned().unwrap_or_default());
    Redirect::to("/uml/abc123")
}

async fn probe(State(stub): State<StubRenderer>) -> Response {
    (stub.probe_status, stub.probe_body.clone()).into_response()
}

async fn png_artifact(State(stub): State<StubRenderer>) -> Response {
    stub.format_fetches.fetch_add(1, Ordering::SeqCst);
    Bytes::from_static(PNG_BYTES).into_response()
}

async fn svg_artifact(State(stub): State<StubRenderer>) -> Response {
    stub.format_fetches.fetch_add(1, Ordering::SeqCst);
    SVG_BODY.into_response()
}

async fn spawn_renderer(stub: &StubRenderer) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener address");
    let app = stub.router();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("serve stub renderer");
    });
    addr
}

fn client_for(addr: SocketAddr) -> RendererClient {
    RendererClient::new(&format!("http://{addr}"), Duration::from_secs(5))
        .expect("valid stub address")
}

fn app_for(client: RendererClient) -> Router {
    build_router(AppState {
        renderer: Arc::new(client),
    })
}

async fn post_render(app: Router, body: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/render-diagram")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
    )
    .await
    .expect("router response")
}

async fn body_bytes(response: Response) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
}

async fn envelope(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("JSON envelope")
}

#[tokio::test]
async fn renders_png_through_the_full_protocol() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;

    let artifact = client_for(addr)
        .render("  @startuml\nAlice -> Bob: hello\n@enduml\n", DiagramFormat::Png)
        .await
        .expect("successful render");

    assert_eq!(artifact.as_ref(), PNG_BYTES);
    // The submitted description is the trimmed form body.
    assert_eq!(
        stub.submissions(),
        vec!["@startuml\nAlice -> Bob: hello\n@enduml".to_string()]
    );
    assert_eq!(stub.format_fetches(), 1);
}

#[tokio::test]
async fn txt_render_returns_probe_body_without_third_call() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;

    let artifact = client_for(addr)
        .render("@startuml\n@enduml", DiagramFormat::Txt)
        .await
        .expect("successful render");

    assert_eq!(artifact.as_ref(), CLEAN_TXT.as_bytes());
    assert_eq!(stub.format_fetches(), 0);
}

#[tokio::test]
async fn syntax_failure_carries_structured_detail() {
    let stub = StubRenderer::new(StatusCode::BAD_REQUEST, SYNTAX_BODY);
    let addr = spawn_renderer(&stub).await;

    let error = client_for(addr)
        .render("@startuml\nAlice => Bob", DiagramFormat::Png)
        .await
        .expect_err("syntax failure");

    match error {
        RenderError::Syntax { detail: Some(detail) } => {
            assert_eq!(detail.line_number, 5);
            assert_eq!(detail.line_with_error, "expected '@enduml'");
            assert_eq!(detail.raw, SYNTAX_BODY);
        }
        other => panic!("expected structured syntax failure, got {other:?}"),
    }
    // A detected syntax failure short-circuits the artifact fetch.
    assert_eq!(stub.format_fetches(), 0);
}

#[tokio::test]
async fn probe_rejection_without_marker_is_syntax_without_detail() {
    let stub = StubRenderer::new(StatusCode::BAD_REQUEST, "renderer exploded in prose");
    let addr = spawn_renderer(&stub).await;

    let error = client_for(addr)
        .render("@startuml\n@enduml", DiagramFormat::Svg)
        .await
        .expect_err("syntax failure");

    assert!(matches!(error, RenderError::Syntax { detail: None }));
}

#[tokio::test]
async fn unexpected_probe_status_is_unavailable() {
    let stub = StubRenderer::new(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let addr = spawn_renderer(&stub).await;

    let error = client_for(addr)
        .render("@startuml\n@enduml", DiagramFormat::Png)
        .await
        .expect_err("operational failure");

    assert!(matches!(error, RenderError::Unavailable { .. }));
}

#[tokio::test]
async fn transport_failure_is_operational_never_syntax() {
    // Bind and immediately drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe listener address");
    drop(listener);

    let result = client_for(addr)
        .render("@startuml\n@enduml", DiagramFormat::Png)
        .await;

    match result {
        Err(RenderError::Unavailable { .. }) | Err(RenderError::Internal { .. }) => {}
        other => panic!("expected operational failure, got {other:?}"),
    }
}

#[tokio::test]
async fn handler_returns_raw_artifact_bytes() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = post_render(
        app,
        r#"{"data": "@startuml\nAlice -> Bob\n@enduml", "format": "png"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(body_bytes(response).await.as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn handler_maps_syntax_failure_to_code_3() {
    let stub = StubRenderer::new(StatusCode::BAD_REQUEST, SYNTAX_BODY);
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = post_render(app, r#"{"data": "@startuml", "format": "svg"}"#).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope["ok"], serde_json::json!(false));
    assert_eq!(envelope["error_code"], serde_json::json!(3));
    assert_eq!(
        envelope["error_data"]["syntax_error_line"],
        serde_json::json!(5)
    );
    assert_eq!(
        envelope["error_data"]["line_with_error"],
        serde_json::json!("expected '@enduml'")
    );
    assert_eq!(envelope["error_data"]["raw"], serde_json::json!(SYNTAX_BODY));
}

#[tokio::test]
async fn handler_rejects_malformed_body_with_code_2() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = post_render(app, "this is not json").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope["error_code"], serde_json::json!(2));
    assert_eq!(envelope["error_data"], serde_json::Value::Null);
    assert!(stub.submissions().is_empty());
}

#[tokio::test]
async fn handler_rejects_unknown_format_with_code_4() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = post_render(app, r#"{"data": "@startuml", "format": "pdf"}"#).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope["error_code"], serde_json::json!(4));
    // Rejected before the client is invoked.
    assert!(stub.submissions().is_empty());
}

#[tokio::test]
async fn handler_rejects_blank_description_with_code_4() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = post_render(app, r#"{"data": "   \n\t", "format": "svg"}"#).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope["error_code"], serde_json::json!(4));
    assert!(stub.submissions().is_empty());
}

#[tokio::test]
async fn handler_maps_unreachable_renderer_to_code_4() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe listener address");
    drop(listener);
    let app = app_for(client_for(addr));

    let response = post_render(app, r#"{"data": "@startuml", "format": "svg"}"#).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope["error_code"], serde_json::json!(4));
    assert_eq!(envelope["error_data"], serde_json::Value::Null);
}

#[tokio::test]
async fn ui_is_served_at_the_root() {
    let stub = StubRenderer::healthy();
    let addr = spawn_renderer(&stub).await;
    let app = app_for(client_for(addr));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/html")
    );
    let body = body_bytes(response).await;
    assert!(body.starts_with(b"<!doctype html>"));
}
