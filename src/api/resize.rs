// 缩放 API
//
// 提供批量缩放的 HTTP 端点。
// 选择器通过查询参数 `async` 传入："true" / "false" / 其他值。

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::models::{ResizeRequest, Strategy};

use super::error::{ApiError, ApiResult};
use super::response::ApiResponse;
use super::AppState;

/// 缩放请求的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ResizeQuery {
    /// 策略选择器
    #[serde(rename = "async")]
    pub selector: Option<String>,
}

/// 批量缩放
///
/// # 端点
/// POST /v1/resize?async={selector}
///
/// # 请求体
/// ```json
/// {
///   "urls": ["http://example.com/a.jpeg"],
///   "width": 100,
///   "height": 0
/// }
/// ```
///
/// # 响应
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "url": "http://localhost:8080/v1/image/{id}.jpeg", "result": "success", "cached": false }
///   ],
///   "message": "1 个 URL 处理完成"
/// }
/// ```
pub async fn resize_images(
    State(state): State<AppState>,
    Query(query): Query<ResizeQuery>,
    Json(request): Json<ResizeRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.urls.is_empty() {
        return Err(ApiError::Validation("urls 不能为空".to_string()));
    }

    let strategy = Strategy::from_selector(query.selector.as_deref().unwrap_or_default());
    let results = state.dispatcher.process(&request, strategy).await;

    let message = format!("{} 个 URL 处理完成", results.len());
    Ok(ApiResponse::success_with_message(results, message))
}
