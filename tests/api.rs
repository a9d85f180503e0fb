mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::*;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-access-code", CODE)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn income_source() -> StubSource {
    StubSource {
        income: vec![
            invoice("100", 500.0, Some("https://files/inv-100")),
            invoice("101", 80.0, Some("https://files/inv-101")),
            receipt("1", 500.0, "100", Some("https://files/rec-1")),
            receipt("2", 120.0, "90", Some("https://files/rec-2")),
            record(serde_json::json!({"number": "7", "type": 320, "amount": 15})),
        ],
        earlier: HashMap::from([(
            "90".to_string(),
            invoice("90", 120.0, Some("https://files/inv-90")),
        )]),
        files: HashMap::from([
            ("https://files/inv-100".to_string(), pdf(&["inv-100"])),
            ("https://files/inv-101".to_string(), pdf(&["inv-101"])),
            ("https://files/rec-1".to_string(), pdf(&["rec-1"])),
            ("https://files/inv-90".to_string(), pdf(&["inv-90a", "inv-90b"])),
        ]),
        ..Default::default()
    }
}

fn expense_source() -> StubSource {
    StubSource {
        expenses: vec![
            expense("Phone Co", 99.5, Some("https://files/phone-1")),
            expense("Parking", 12.5, None),
            expense("Parking", 7.5, None),
            expense("Water", 40.0, Some("https://files/water-1")),
        ],
        files: HashMap::from([
            ("https://files/phone-1".to_string(), pdf(&["phone-1"])),
            ("https://files/water-1".to_string(), pdf(&["water-1"])),
        ]),
        ..Default::default()
    }
}

fn table() -> bookkeeping_report::models::ExpectationTable {
    expectations(&[("Phone Co", 2), ("Water", 1), ("Electric", 1)])
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app(Arc::new(StubSource::default()), table());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn test_api_requires_access_code() {
    let app = app(Arc::new(StubSource::default()), table());
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/period?date=2024-03-15").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/period?date=2024-03-15")
                .header("x-access-code", "guess")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pages_redirect_to_login_without_cookie() {
    let app = app(Arc::new(StubSource::default()), table());
    let response = app
        .oneshot(Request::builder().uri("/home").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_login_flow() {
    let app = app(Arc::new(StubSource::default()), table());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("code=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(String::from_utf8(body_bytes(response).await).unwrap().contains("Wrong code"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("code={}", CODE)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/home");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with(&format!("access_code={};", CODE)));

    let session = cookie.split(';').next().unwrap().to_string();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/home")
                .header(header::COOKIE, session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("type=\"date\""));
}

#[tokio::test]
async fn test_period_endpoint() {
    let app = app(Arc::new(StubSource::default()), table());

    let response = app.clone().oneshot(get("/api/period?date=2024-03-10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let period = body_json(response).await;
    assert_eq!(period["start_date"], "2024-01-01");
    assert_eq!(period["end_date"], "2024-02-29");

    let response = app.oneshot(get("/api/period?date=10/03/2024")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_income_documents_are_reconciled() {
    let source = Arc::new(income_source());
    let app = app(source.clone(), table());

    let response = app.oneshot(get("/api/income/documents?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["period"]["start_date"], "2024-03-01");

    let order: Vec<String> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| format!("{}:{}", d["type"], d["number"].as_str().unwrap()))
        .collect();
    assert_eq!(order, vec!["400:1", "305:100", "400:2", "305:101", "320:7", "305:90"]);

    assert_eq!(
        source.calls(),
        vec![
            "authenticate".to_string(),
            "list income 2024-03-01..2024-04-30".to_string(),
            "get income 90".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_missing_earlier_invoice_aborts() {
    let mut source = income_source();
    source.earlier.clear();
    let app = app(Arc::new(source), table());

    let response = app.oneshot(get("/api/income/file?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_authentication_failure_is_surfaced() {
    let source = StubSource {
        fail_auth: true,
        ..income_source()
    };
    let app = app(Arc::new(source), table());

    let response = app.oneshot(get("/api/report?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "AUTHENTICATION_ERROR");
}

#[tokio::test]
async fn test_income_file_merges_in_reconciled_order() {
    let source = Arc::new(income_source());
    let app = app(source.clone(), table());

    let response = app.oneshot(get("/api/income/file?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"income.pdf\""
    );
    // rec-2 has a link but the file server has nothing for it
    assert_eq!(response.headers()["x-skipped-documents"], "1");

    let bytes = body_bytes(response).await;
    assert_eq!(
        labels(&bytes),
        vec!["rec-1", "inv-100", "inv-101", "inv-90a", "inv-90b"]
    );
    assert_eq!(source.calls().iter().filter(|c| *c == "authenticate").count(), 1);
}

#[tokio::test]
async fn test_expense_file_as_zip() {
    let app = app(Arc::new(expense_source()), table());

    let response = app
        .oneshot(get("/api/expenses/file?date=2024-03-15&format=zip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"expense.zip\""
    );
    assert_eq!(response.headers()["x-skipped-documents"], "0");

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_index(0).unwrap();
    assert_eq!(entry.name(), "expense.pdf");
    let mut pdf_bytes = Vec::new();
    entry.read_to_end(&mut pdf_bytes).unwrap();
    assert_eq!(labels(&pdf_bytes), vec!["phone-1", "water-1"]);
}

#[tokio::test]
async fn test_unknown_file_format_is_rejected() {
    let app = app(Arc::new(expense_source()), table());
    let response = app
        .oneshot(get("/api/expenses/file?date=2024-03-15&format=tar"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expense_audit() {
    let app = app(Arc::new(expense_source()), table());
    let response = app.oneshot(get("/api/expenses/audit?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["missing_suppliers"], serde_json::json!(["Electric"]));
    assert_eq!(body["short_suppliers"], serde_json::json!(["Phone Co"]));
}

#[tokio::test]
async fn test_unlinked_expenses_json_and_csv() {
    let source = Arc::new(expense_source());
    let app = app(source, table());

    let response = app
        .clone()
        .oneshot(get("/api/expenses/unlinked?date=2024-03-15"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_object().unwrap().len(), 1);
    assert!(body.get("Parking").is_some());

    let response = app
        .oneshot(get("/api/expenses/unlinked?date=2024-03-15&format=csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let csv = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(csv.starts_with("supplier,amount\n"));
    assert!(csv.contains("Parking,"));
}

#[tokio::test]
async fn test_summary_uses_one_expense_listing() {
    let source = Arc::new(expense_source());
    let app = app(source.clone(), table());

    let response = app.oneshot(get("/api/report?date=2024-01-05")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["period"]["start_date"], "2023-11-01");
    assert_eq!(body["period"]["end_date"], "2023-12-31");
    assert_eq!(body["discrepancies"]["missing_suppliers"], serde_json::json!(["Electric"]));
    assert!(body["unlinked_expenses"].get("Parking").is_some());

    assert_eq!(
        source.calls(),
        vec![
            "authenticate".to_string(),
            "list expense 2023-11-01..2023-12-31".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_report_page() {
    let app = app(Arc::new(expense_source()), table());
    let response = app.oneshot(get("/report?date=2024-03-15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Report for period 2024-03-01 - 2024-04-30"));
    assert!(html.contains("<li>Electric</li>"));
    assert!(html.contains("<li>Phone Co</li>"));
    assert!(html.contains("<td>Parking</td>"));
}
