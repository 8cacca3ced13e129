use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use er_core::domain::error::AppError;
use er_core::domain::types::RewriteRequest;
use er_core::usecase::rewrite_service::RewriteService;

/// ハンドラーエラー型（ボディは常に {"error": "..."}）
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No data provided")]
    NoData,
    #[error("{}", .0.message)]
    App(#[from] AppError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoData => StatusCode::BAD_REQUEST,
            ApiError::App(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::App(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// 文字列以外・null は未指定として扱う
fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

/// リクエストボディを RewriteRequest に変換する（必須項目の検証はサービス側）
pub fn parse_body(body: &[u8]) -> ApiResult<RewriteRequest> {
    let data = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ApiError::NoData),
    };

    Ok(RewriteRequest {
        email_text: string_field(&data, "email_text").unwrap_or_default(),
        reason: string_field(&data, "reason").unwrap_or_default(),
        instruction: string_field(&data, "instruction").unwrap_or_default(),
        model: string_field(&data, "model"),
        api_key: string_field(&data, "api_key"),
        base_url: string_field(&data, "base_url"),
    })
}

// --- Handlers ---

pub async fn rewrite_email(
    State(service): State<Arc<RewriteService>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request_id = uuid::Uuid::new_v4();
    let req = parse_body(&body).inspect_err(|e| {
        log::info!("[{request_id}] rejected rewrite request: {e}");
    })?;

    log::info!(
        "[{request_id}] rewrite request: {} chars of email text",
        req.email_text.chars().count()
    );

    let outcome = service.rewrite(&req).await.map_err(|e| {
        if e.is_validation() {
            log::info!("[{request_id}] rejected rewrite request: {e}");
        } else {
            log::error!("[{request_id}] rewrite aborted: {e}");
        }
        ApiError::from(e)
    })?;

    log::info!(
        "[{request_id}] rewrite finished: {}",
        if outcome.is_success() { "success" } else { "failure" }
    );

    // パイプライン失敗も 200 で返し、error キーで区別する
    Ok(Json(outcome).into_response())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
