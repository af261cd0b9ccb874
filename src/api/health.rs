use axum::{
    extract::State,
    response::IntoResponse,
};
use serde_json::json;

use super::AppState;
use super::error::ApiResult;
use super::response::success;

/// 健康检查端点
pub async fn health_check(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let cache = state.dispatcher.cache();

    Ok(success(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "entries": cache.entry_count(),
            "capacity": state.config.cache_capacity,
            "key_scheme": state.config.key_scheme,
        },
        "in_flight": state.dispatcher.in_flight_count(),
    })))
}
