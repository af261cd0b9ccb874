// 缓存图片 API
//
// 按缩放结果中的 URL 返回缓存中的 JPEG 数据。
// 乐观快速路径返回的 URL 在后台缩放完成前会得到 404，调用方可以轮询。

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::services::resize::CacheKey;

use super::error::{ApiError, ApiResult};
use super::AppState;

/// 获取缓存图片
///
/// # 端点
/// GET /v1/image/{id}.jpeg
pub async fn get_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    let key = CacheKey::from_file_name(&file)
        .ok_or_else(|| ApiError::BadRequest(format!("无效的图片路径: {}", file)))?;

    let data = state
        .dispatcher
        .cache()
        .get(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("图片不在缓存中: {}", key)))?;

    tracing::debug!("返回缓存图片: {} ({} 字节)", key, data.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(format!("构建响应失败: {}", e)))
}
