//! HTTP API tests, driving the router in-process.

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use office2pdf::{router, AppState, ConversionConfig, ServerConfig, SlideRendering};
use serde_json::Value;
use tempfile::TempDir;

const ROUTES: [&str; 4] = [
    "/convert/word-to-pdf",
    "/convert/excel-to-pdf",
    "/convert/ipynb-to-pdf",
    "/convert/ppt-to-pdf",
];

struct Harness {
    server: TestServer,
    temp_root: TempDir,
    rasterises: bool,
}

impl Harness {
    fn new() -> Self {
        Self::with_limit(50 * 1024 * 1024)
    }

    fn with_limit(max_upload_bytes: usize) -> Self {
        let conversion = ConversionConfig::builder()
            .slide_rendering(SlideRendering::Vector)
            .build()
            .unwrap();
        Self::with_config(conversion, max_upload_bytes)
    }

    fn with_config(conversion: ConversionConfig, max_upload_bytes: usize) -> Self {
        let temp_root = tempfile::tempdir().unwrap();
        let server_config = ServerConfig {
            temp_root: temp_root.path().to_path_buf(),
            max_upload_bytes,
            cleanup_attempts: 2,
            cleanup_delay_ms: 1,
            ..ServerConfig::default()
        };
        let state = AppState::new(conversion, server_config);
        let rasterises = state.converter.rasterises_slides();
        Self {
            server: TestServer::new(router(state)).unwrap(),
            temp_root,
            rasterises,
        }
    }

    /// Entries left behind under the temp root.
    fn leftovers(&self) -> usize {
        std::fs::read_dir(self.temp_root.path()).unwrap().count()
    }
}

fn upload(bytes: Vec<u8>, file_name: &str) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(file_name))
}

fn error_message(response: &axum_test::TestResponse) -> String {
    let body: Value = response.json();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn missing_file_field_is_400_on_every_route() {
    let h = Harness::new();
    for route in ROUTES {
        let response = h
            .server
            .post(route)
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!error_message(&response).is_empty(), "{route}");
    }
}

#[tokio::test]
async fn non_multipart_body_is_400_json() {
    let h = Harness::new();
    let response = h.server.post("/convert/word-to-pdf").text("hello").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(error_message(&response).contains("multipart"));
}

#[tokio::test]
async fn empty_filename_and_empty_file_are_400() {
    let h = Harness::new();
    let no_name = MultipartForm::new().add_part("file", Part::bytes(common::docx()));
    let response = h.server.post("/convert/word-to-pdf").multipart(no_name).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post("/convert/word-to-pdf")
        .multipart(upload(Vec::new(), "empty.docx"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(error_message(&response).contains("empty"));
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn wrong_extension_is_400() {
    let h = Harness::new();
    let response = h
        .server
        .post("/convert/excel-to-pdf")
        .multipart(upload(common::docx(), "report.docx"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(error_message(&response).contains(".docx"));
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn every_format_converts_to_pdf() {
    let h = Harness::new();
    let cases = [
        ("/convert/word-to-pdf", common::docx(), "report.docx"),
        (
            "/convert/excel-to-pdf",
            common::xlsx("Sheet1", &[vec!["a", "b"], vec!["1", "2"]]),
            "book.xlsx",
        ),
        ("/convert/ipynb-to-pdf", common::notebook(), "analysis.ipynb"),
        (
            "/convert/ppt-to-pdf",
            common::pptx(&[&["Hello"], &["World"]]),
            "deck.pptx",
        ),
    ];
    for (route, bytes, name) in cases {
        let response = h.server.post(route).multipart(upload(bytes, name)).await;
        response.assert_status_ok();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf", "{route}");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"converted.pdf\"",
            "{route}"
        );
        let body = response.as_bytes();
        assert!(body.starts_with(b"%PDF-"), "{route}");
        lopdf::Document::load_mem(body).unwrap();
    }
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn default_raster_slides_through_the_api() {
    let conversion = ConversionConfig::builder().slide_dpi(48).build().unwrap();
    let h = Harness::with_config(conversion, 50 * 1024 * 1024);
    if !h.rasterises {
        eprintln!("no system font installed; skipping");
        return;
    }
    let response = h
        .server
        .post("/convert/ppt-to-pdf")
        .multipart(upload(common::pptx(&[&["One"], &["Two"]]), "deck.pptx"))
        .await;
    response.assert_status_ok();
    assert_eq!(common::images_per_page(response.as_bytes()), vec![1, 1]);
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn fake_ppt_is_500_with_message() {
    let h = Harness::new();
    let response = h
        .server
        .post("/convert/ppt-to-pdf")
        .multipart(upload(b"definitely not a zip".to_vec(), "legacy.ppt"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_message(&response).contains("legacy.ppt"));
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn broken_notebook_is_500() {
    let h = Harness::new();
    let response = h
        .server
        .post("/convert/ipynb-to-pdf")
        .multipart(upload(br#"{"nbformat": 4}"#.to_vec(), "nb.ipynb"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_message(&response).contains("cells"));
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let h = Harness::with_limit(1024);
    let response = h
        .server
        .post("/convert/word-to-pdf")
        .multipart(upload(vec![b'x'; 8 * 1024], "big.docx"))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.leftovers(), 0);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let h = Harness::new();
    let response = h
        .server
        .post("/convert/ipynb-to-pdf")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
        .multipart(upload(common::notebook(), "nb.ipynb"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn index_and_health() {
    let h = Harness::new();
    let banner = h.server.get("/").await.text();
    assert!(banner.contains("/convert/ppt-to-pdf"));

    let health: Value = h.server.get("/health").await.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn concurrent_uploads_do_not_collide() {
    let h = Harness::new();
    let requests = (0..6).map(|i| {
        let title = format!("Deck {i}");
        let form = upload(common::pptx(&[&[title.as_str()]]), "same-name.pptx");
        let request = h.server.post("/convert/ppt-to-pdf").multipart(form);
        async move { request.await }
    });
    let responses = futures::future::join_all(requests).await;
    for response in responses {
        response.assert_status_ok();
    }
    assert_eq!(h.leftovers(), 0);
}
