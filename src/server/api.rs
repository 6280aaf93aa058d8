use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use log::{error, info};
use tokio::task::spawn_blocking;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::error::RecognizeError;
use crate::metrics::{self, Outcome};
use crate::recognizer::Recognition;
use crate::utils::{self, ImageData};

/// 识别用户拍摄的物体，返回对应的行星 ID
#[utoipa::path(
    post,
    path = "/api/recognize-stamp-object",
    request_body = RecognizeRequest,
    responses(
        (status = 200, body = RecognizeResponse),
        (status = 400, body = ErrorResponse, description = "图片数据缺失或无法解码"),
        (status = 500, body = ErrorResponse, description = "服务初始化失败或嵌入服务出错"),
    )
)]
pub async fn recognize_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RecognizeRequest>, JsonRejection>,
) -> Result<Json<RecognizeResponse>> {
    let result = recognize(&state, payload).await;
    match &result {
        Ok(resp) => info!("识别完成: {:?}", resp.0),
        Err(e) if e.status().is_client_error() => {
            metrics::inc_recognize_count(Outcome::Invalid);
            info!("无效请求: {:#}", e.0);
        }
        Err(e) => {
            metrics::inc_recognize_count(Outcome::Error);
            error!("图片识别失败: {:#}", e.0);
        }
    }
    result
}

async fn recognize(
    state: &AppState,
    payload: std::result::Result<Json<RecognizeRequest>, JsonRejection>,
) -> Result<Json<RecognizeResponse>> {
    // 初始化失败时不尝试匹配，也不检查请求内容
    let recognizer = state.recognizer()?;
    let Json(data) = payload.map_err(|e| RecognizeError::InvalidInput(e.body_text()))?;

    let payload = data
        .image
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RecognizeError::InvalidInput("missing image data".to_string()))?;
    let bytes = utils::decode_base64_image(&payload)?;

    let image = spawn_blocking(move || ImageData::decode(bytes))
        .await?
        .map_err(|e| RecognizeError::InvalidInput(e.to_string()))?;

    let start = Instant::now();
    let recognition = recognizer.recognize(&image).await?;
    metrics::inc_recognize_duration(image.size(), start.elapsed().as_secs_f32());

    let (outcome, score) = match &recognition {
        Recognition::Planet { score, .. } => (Outcome::Success, *score),
        Recognition::Unmapped { score, .. } => (Outcome::Unmapped, *score),
        Recognition::NoMatch { score } => (Outcome::NoMatch, *score),
    };
    metrics::inc_recognize_count(outcome);
    metrics::inc_recognize_max_score(score);

    Ok(Json(recognition.into()))
}
