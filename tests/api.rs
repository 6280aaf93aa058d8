use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rstest::*;
use serde_json::{Value, json};
use stamp_vision::Recognizer;
use stamp_vision::config::CatalogOptions;
use stamp_vision::embedding::{EmbedIntent, Embedder, HistogramEmbedder};
use stamp_vision::error::InitError;
use stamp_vision::server::{AppState, create_app};
use stamp_vision::utils::ImageData;
use tempfile::TempDir;
use tower::ServiceExt;

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [0, 0, 255];

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut buf = Cursor::new(vec![]);
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn data_url(color: [u8; 3]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png(color)))
}

/// 参考图片目录：stamp_1 有行星映射，stamp_9 没有
#[fixture]
fn reference_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (object_id, color) in [("stamp_1", RED), ("stamp_9", GREEN)] {
        fs::create_dir(dir.path().join(object_id)).unwrap();
        fs::write(dir.path().join(object_id).join("1.png"), png(color)).unwrap();
    }
    dir
}

fn catalog_options(path: &Path) -> CatalogOptions {
    CatalogOptions {
        reference_dir: PathBuf::from(path),
        suffix: "jpg,jpeg,png,webp".to_string(),
        planet_map: None,
        threshold: 0.7,
    }
}

async fn app_with(path: &Path, embedder: Arc<dyn Embedder>) -> Router {
    let recognizer = Recognizer::load(&catalog_options(path), embedder).await;
    create_app(AppState::new(recognizer))
}

async fn post(app: Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, Some("application/json"), body.to_string()).await
}

async fn post_raw(
    app: Router,
    content_type: Option<&str>,
    body: impl Into<Body>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri("/api/recognize-stamp-object");
    if let Some(content_type) = content_type {
        req = req.header("content-type", content_type);
    }
    let resp = app.oneshot(req.body(body.into()).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// 参考图片正常计算，查询图片总是失败
struct QueryFailEmbedder(HistogramEmbedder);

impl Embedder for QueryFailEmbedder {
    fn embed<'a>(
        &'a self,
        image: &'a ImageData,
        intent: EmbedIntent,
    ) -> BoxFuture<'a, Result<Vec<f32>>> {
        match intent {
            EmbedIntent::Document => self.0.embed(image, intent),
            EmbedIntent::Query => future::ready(Err(anyhow!("deadline exceeded"))).boxed(),
        }
    }

    fn name(&self) -> &str {
        "query-fail"
    }
}

#[rstest]
#[tokio::test]
async fn recognize_success(reference_dir: TempDir) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, body) = post(app, json!({ "image": data_url(RED) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "planet_id": "earth"}));
}

#[rstest]
#[tokio::test]
async fn recognize_plain_base64(reference_dir: TempDir) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, body) = post(app, json!({ "image": STANDARD.encode(png(RED)) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["planet_id"], "earth");
}

#[rstest]
#[tokio::test]
async fn recognize_no_match(reference_dir: TempDir) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, body) = post(app, json!({ "image": data_url(BLUE) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "no_match"}));
}

#[rstest]
#[tokio::test]
async fn recognize_unmapped_is_distinct(reference_dir: TempDir) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, body) = post(app, json!({ "image": data_url(GREEN) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_match");
    assert!(body["description"].as_str().unwrap().contains("stamp_9"));
}

#[rstest]
#[case::missing(json!({}))]
#[case::null(json!({ "image": null }))]
#[case::empty(json!({ "image": "" }))]
#[case::malformed(json!({ "image": "data:image/png;base64,%%%not-base64%%%" }))]
#[case::not_an_image(json!({ "image": STANDARD.encode(b"plain text") }))]
#[tokio::test]
async fn recognize_invalid_input(reference_dir: TempDir, #[case] body: Value) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, resp) = post(app.clone(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["detail"].is_string());

    // 无效请求不影响后续识别
    let (status, resp) = post(app, json!({ "image": data_url(RED) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["planet_id"], "earth");
}

#[rstest]
#[case::image_not_a_string(Some("application/json"), r#"{"image": 123}"#)]
#[case::truncated_json(Some("application/json"), r#"{"image": "data:image/png;base64,iVBO"#)]
#[case::not_an_object(Some("application/json"), r#"["image"]"#)]
#[case::missing_content_type(None, r#"{"image": "QUJD"}"#)]
#[case::wrong_content_type(Some("text/plain"), r#"{"image": "QUJD"}"#)]
#[tokio::test]
async fn recognize_malformed_body(
    reference_dir: TempDir,
    #[case] content_type: Option<&str>,
    #[case] body: &'static str,
) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let (status, resp) = post_raw(app.clone(), content_type, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["detail"].as_str().unwrap().starts_with("invalid image"));

    let (status, resp) = post(app, json!({ "image": data_url(RED) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["planet_id"], "earth");
}

#[rstest]
#[tokio::test]
async fn recognize_backend_failure(reference_dir: TempDir) {
    let embedder = Arc::new(QueryFailEmbedder(HistogramEmbedder::new(4)));
    let app = app_with(reference_dir.path(), embedder).await;
    let (status, body) = post(app, json!({ "image": data_url(RED) })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("deadline exceeded"));
}

#[tokio::test]
async fn recognize_after_init_failure() {
    let dir = TempDir::new().unwrap();
    let app = app_with(&dir.path().join("missing"), Arc::new(HistogramEmbedder::new(4))).await;

    // 初始化失败时，即使请求无效也返回初始化错误
    let valid = json!({ "image": data_url(RED) }).to_string();
    let requests = [
        (Some("application/json"), valid),
        (Some("application/json"), "{}".to_string()),
        (Some("application/json"), r#"{"image": 123}"#.to_string()),
        (Some("application/json"), r#"{"image": "QUJ"#.to_string()),
        (None, r#"{"image": "QUJD"}"#.to_string()),
    ];
    for (content_type, body) in requests {
        let (status, resp) = post_raw(app.clone(), content_type, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = resp["detail"].as_str().unwrap();
        assert!(detail.contains("initialization failed"));
        assert!(detail.contains("reference directory not found"));
    }
}

#[tokio::test]
async fn recognize_after_setup_failure() {
    let app = create_app(AppState::new(Err(InitError::Setup("missing Gemini API key".into()))));
    let (status, resp) = post(app, json!({ "image": data_url(RED) })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp["detail"].as_str().unwrap().contains("missing Gemini API key"));
}

#[rstest]
#[tokio::test]
async fn openapi_document(reference_dir: TempDir) {
    let app = app_with(reference_dir.path(), Arc::new(HistogramEmbedder::new(4))).await;
    let req = Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/api/recognize-stamp-object"]["post"].is_object());
}
