pub mod error;
pub mod health;
pub mod image;
pub mod resize;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServiceConfig;
use crate::services::resize::{
    DispatcherSettings, HttpFetcher, JpegTransformer, MemoryImageCache, ResizeDispatcher,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub dispatcher: ResizeDispatcher,
}

impl AppState {
    /// 按配置组装抓取器、转换器、缓存与调度器
    ///
    /// 缓存在这里创建一次，整个进程生命周期内共享，不会重置。
    pub fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_limit_bytes, config.fetch_timeout())?;
        let transformer =
            JpegTransformer::new(config.jpeg_quality).with_max_pixels(config.max_output_pixels);
        let cache = MemoryImageCache::new(config.cache_capacity);

        let settings = DispatcherSettings {
            public_base_url: config.public_base_url.clone(),
            key_scheme: config.key_scheme,
            resize_timeout: config.resize_timeout(),
        };
        let dispatcher = ResizeDispatcher::new(
            Arc::new(fetcher),
            Arc::new(transformer),
            Arc::new(cache),
            settings,
        );

        Ok(Self {
            config: Arc::new(config),
            dispatcher,
        })
    }
}

/// 构建全部路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Image Resizer Backend API v1.0" }))
        // Health
        .route("/api/health", get(health::health_check))
        // Resize
        .route("/v1/resize", post(resize::resize_images))
        // Cached images
        .route("/v1/image/:file", get(image::get_image))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
