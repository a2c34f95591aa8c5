//! REST tests for the invoice API through `axum_test::TestServer`

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use invoicer::config::{DocumentFormat, InvoicingConfig};
use invoicer::render::{DocumentTemplate, TextRenderer};
use invoicer::server::ServerBuilder;
use invoicer::storage::{InMemoryArtifactStore, InMemoryInvoiceStore};
use serde_json::{Value, json};

fn user_header() -> HeaderName {
    HeaderName::from_static("x-user-id")
}

fn user(id: &'static str) -> HeaderValue {
    HeaderValue::from_static(id)
}

fn make_server_with(config: InvoicingConfig) -> TestServer {
    let builder = ServerBuilder::new()
        .with_config(config.clone())
        .with_store(InMemoryInvoiceStore::new())
        .with_artifact_store(InMemoryArtifactStore::new());

    let builder = match config.documents.format {
        DocumentFormat::Text => {
            builder.with_renderer(TextRenderer::new(DocumentTemplate::builtin().unwrap()))
        }
        DocumentFormat::Pdf => builder,
    };

    TestServer::try_new(builder.build().unwrap()).unwrap()
}

fn make_server() -> TestServer {
    let mut config = InvoicingConfig::default();
    config.documents.format = DocumentFormat::Text;
    make_server_with(config)
}

fn widget() -> Value {
    json!({
        "line_items": [{"description": "Widget", "quantity": 2, "unit_price": 9.5}]
    })
}

async fn create(server: &TestServer, owner: &'static str) -> Value {
    let response = server
        .post("/api/invoices")
        .add_header(user_header(), user(owner))
        .json(&widget())
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

// ==============================================================
// Create
// ==============================================================

#[tokio::test]
async fn test_rest_create() {
    let server = make_server();

    let body = create(&server, "u1").await;

    assert_eq!(body["owner_id"], "u1");
    assert_eq!(body["total"], 19.0);
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["line_items"][0]["description"], "Widget");
    let id = body["id"].as_str().unwrap();
    uuid::Uuid::parse_str(id).unwrap();
    assert_eq!(body["document_ref"], format!("invoice-{}.txt", id));
}

#[tokio::test]
async fn test_rest_create_ignores_client_owner_and_total() {
    let server = make_server();

    let response = server
        .post("/api/invoices")
        .add_header(user_header(), user("u1"))
        .json(&json!({
            "owner_id": "u2",
            "total": 1000,
            "line_items": [{"description": "Widget", "quantity": 2, "unit_price": 9.5}]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["owner_id"], "u1");
    assert_eq!(body["total"], 19.0);
}

#[tokio::test]
async fn test_rest_create_without_identity_is_unauthorized() {
    let server = make_server();

    let response = server.post("/api/invoices").json(&widget()).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_rest_create_empty_line_items() {
    let server = make_server();

    let response = server
        .post("/api/invoices")
        .add_header(user_header(), user("u1"))
        .json(&json!({"line_items": []}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["fields"][0]["field"], "line_items");
}

#[tokio::test]
async fn test_rest_create_malformed_json() {
    let server = make_server();

    let response = server
        .post("/api/invoices")
        .add_header(user_header(), user("u1"))
        .json(&json!({"line_items": "lots"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ==============================================================
// Read
// ==============================================================

#[tokio::test]
async fn test_rest_get_and_list() {
    let server = make_server();
    let first = create(&server, "u1").await;
    create(&server, "u2").await;
    let second = create(&server, "u1").await;

    let id = first["id"].as_str().unwrap();
    let response = server
        .get(&format!("/api/invoices/{}", id))
        .add_header(user_header(), user("u1"))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body, first);

    let response = server
        .get("/api/invoices")
        .add_header(user_header(), user("u1"))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["invoices"][0]["id"], first["id"]);
    assert_eq!(body["invoices"][1]["id"], second["id"]);
}

#[tokio::test]
async fn test_rest_foreign_invoice_is_not_found() {
    let server = make_server();
    let created = create(&server, "u1").await;
    let id = created["id"].as_str().unwrap();
    let path = format!("/api/invoices/{}", id);

    let response = server.get(&path).add_header(user_header(), user("u2")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVOICE_NOT_FOUND");

    server
        .patch(&path)
        .add_header(user_header(), user("u2"))
        .json(&json!({"notes": "mine now"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .delete(&path)
        .add_header(user_header(), user("u2"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .get(&format!("{}/document", path))
        .add_header(user_header(), user("u2"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rest_invalid_id_is_bad_request() {
    let server = make_server();

    let response = server
        .get("/api/invoices/not-a-uuid")
        .add_header(user_header(), user("u1"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ==============================================================
// Update
// ==============================================================

#[tokio::test]
async fn test_rest_update() {
    let server = make_server();
    let created = create(&server, "u1").await;
    let path = format!("/api/invoices/{}", created["id"].as_str().unwrap());

    let response = server
        .patch(&path)
        .add_header(user_header(), user("u1"))
        .json(&json!({
            "line_items": [{"description": "X", "quantity": 1, "unit_price": 5}],
            "status": "ISSUED"
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 5.0);
    assert_eq!(body["status"], "ISSUED");
    assert_eq!(body["document_ref"], created["document_ref"]);
}

#[tokio::test]
async fn test_rest_update_null_clears_field() {
    let server = make_server();
    let response = server
        .post("/api/invoices")
        .add_header(user_header(), user("u1"))
        .json(&json!({
            "customer_email": "billing@acme.test",
            "notes": "net 30",
            "line_items": [{"description": "Widget", "quantity": 1, "unit_price": 4}]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let path = format!("/api/invoices/{}", created["id"].as_str().unwrap());

    let response = server
        .patch(&path)
        .add_header(user_header(), user("u1"))
        .json(&json!({"customer_email": null}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["customer_email"], Value::Null);
    assert_eq!(body["notes"], "net 30");
    assert_eq!(body["total"], 4.0);
}

#[tokio::test]
async fn test_rest_invalid_transition() {
    let server = make_server();
    let created = create(&server, "u1").await;
    let path = format!("/api/invoices/{}", created["id"].as_str().unwrap());

    let response = server
        .patch(&path)
        .add_header(user_header(), user("u1"))
        .json(&json!({"status": "PAID"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("DRAFT"));
}

// ==============================================================
// Delete
// ==============================================================

#[tokio::test]
async fn test_rest_delete() {
    let server = make_server();
    let created = create(&server, "u1").await;
    let path = format!("/api/invoices/{}", created["id"].as_str().unwrap());

    server
        .delete(&path)
        .add_header(user_header(), user("u1"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&path)
        .add_header(user_header(), user("u1"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ==============================================================
// Documents
// ==============================================================

#[tokio::test]
async fn test_rest_text_document() {
    let server = make_server();
    let created = create(&server, "u1").await;
    let path = format!("/api/invoices/{}/document", created["id"].as_str().unwrap());

    let response = server.get(&path).add_header(user_header(), user("u1")).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        HeaderValue::from_static("text/plain; charset=utf-8")
    );
    assert!(response.text().contains("TOTAL: 19.00 EUR"));
}

#[tokio::test]
async fn test_rest_pdf_document() {
    let server = make_server_with(InvoicingConfig::default());
    let created = create(&server, "u1").await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["document_ref"], format!("invoice-{}.pdf", id));

    let response = server
        .get(&format!("/api/invoices/{}/document", id))
        .add_header(user_header(), user("u1"))
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        HeaderValue::from_static("application/pdf")
    );
    assert!(response.as_bytes().starts_with(b"%PDF-"));
    assert_eq!(
        response.header("x-content-type-options"),
        HeaderValue::from_static("nosniff")
    );
}

// ==============================================================
// Health
// ==============================================================

#[tokio::test]
async fn test_health() {
    let server = make_server();

    for path in ["/health", "/healthz"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

// ==============================================================
// Security headers
// ==============================================================

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let server = make_server();

    let health = server.get("/health").await;
    let unauthorized = server.get("/api/invoices").await;
    unauthorized.assert_status(StatusCode::UNAUTHORIZED);

    for response in [health, unauthorized] {
        assert_eq!(
            response.header("x-content-type-options"),
            HeaderValue::from_static("nosniff")
        );
        assert_eq!(
            response.header("x-frame-options"),
            HeaderValue::from_static("SAMEORIGIN")
        );
        assert_eq!(
            response.header("referrer-policy"),
            HeaderValue::from_static("no-referrer")
        );
        assert_eq!(
            response.header("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin")
        );
        assert_eq!(response.header("x-xss-protection"), HeaderValue::from_static("0"));
        assert!(response.headers().get("content-security-policy").is_some());
        assert!(response.headers().get("strict-transport-security").is_some());
    }
}

#[tokio::test]
async fn test_security_headers_disabled_by_config() {
    let mut config = InvoicingConfig::default();
    config.documents.format = DocumentFormat::Text;
    config.server.security_headers = false;
    let server = make_server_with(config);

    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);
    assert!(response.headers().get("x-content-type-options").is_none());
    assert!(response.headers().get("x-frame-options").is_none());
}
