// 缩放调度器 - 协调抓取、转换与缓存
//
// 本模块是缩放流水线的核心，负责：
// - 按选择器在三种执行策略之间分派
// - 缓存命中时直接返回，不抓取也不转换
// - 同一个键的并发请求共享一次计算
// - 把每个 URL 的错误折叠为 success / failure，单个失败不影响整批

use crate::models::{ResizeRequest, ResizeResult, Strategy};
use crate::services::resize::cache::ImageCache;
use crate::services::resize::error::ResizeError;
use crate::services::resize::fetcher::Fetcher;
use crate::services::resize::key::{CacheKey, KeyScheme};
use crate::services::resize::singleflight::{wait_for_leader, Flight, SingleFlight};
use crate::services::resize::transform::{await_resize, spawn_resize, ImageTransformer, TransformTask};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 调度器设置
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// 对外 URL 前缀
    pub public_base_url: String,

    /// 缓存键方案
    pub key_scheme: KeyScheme,

    /// 有限等待策略的缩放超时
    pub resize_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8080".to_string(),
            key_scheme: KeyScheme::SourceOnly,
            resize_timeout: Duration::from_secs(3),
        }
    }
}

/// 单个 URL 的计算来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    /// 本次请求完成了抓取与转换
    Fresh,
    /// 注册后发现其他请求已经写入缓存
    Cached,
    /// 等待并共享了另一个请求的计算结果
    Shared,
}

/// 缩放调度器
///
/// 所有字段都是共享句柄，克隆开销很小，可以直接移动到后台任务中。
#[derive(Clone)]
pub struct ResizeDispatcher {
    fetcher: Arc<dyn Fetcher>,
    transformer: Arc<dyn ImageTransformer>,
    cache: Arc<dyn ImageCache>,
    flights: Arc<SingleFlight>,
    settings: DispatcherSettings,
}

impl ResizeDispatcher {
    /// 创建新的调度器
    ///
    /// # 参数
    /// - `fetcher`: 源图片抓取器
    /// - `transformer`: 图片转换器
    /// - `cache`: 进程级共享缓存
    /// - `settings`: 调度器设置
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        transformer: Arc<dyn ImageTransformer>,
        cache: Arc<dyn ImageCache>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            fetcher,
            transformer,
            cache,
            flights: Arc::new(SingleFlight::new()),
            settings,
        }
    }

    /// 共享缓存句柄
    pub fn cache(&self) -> &Arc<dyn ImageCache> {
        &self.cache
    }

    /// 当前正在计算的键数量
    pub fn in_flight_count(&self) -> usize {
        self.flights.in_flight_count()
    }

    /// 处理一个批量缩放请求
    ///
    /// 按输入顺序逐个处理 URL，返回与输入等长、同序的结果列表。
    /// 本方法不会整体失败，单个 URL 的错误只会体现为该 URL 的 failure。
    pub async fn process(&self, request: &ResizeRequest, strategy: Strategy) -> Vec<ResizeResult> {
        info!(
            "开始处理缩放请求: {} 个 URL, 目标尺寸 {}x{}, 策略 {}",
            request.urls.len(),
            request.width,
            request.height,
            strategy.as_str()
        );

        let mut results = Vec::with_capacity(request.urls.len());
        for url in &request.urls {
            let result = self
                .process_url(url, request.width, request.height, strategy)
                .await;
            results.push(result);
        }

        info!(
            "缩放请求处理完成，成功: {}, 失败: {}",
            results.iter().filter(|r| r.is_success()).count(),
            results.iter().filter(|r| !r.is_success()).count()
        );

        results
    }

    /// 处理单个 URL
    async fn process_url(&self, url: &str, width: u32, height: u32, strategy: Strategy) -> ResizeResult {
        let key = CacheKey::derive_with(self.settings.key_scheme, url, width, height);
        let public_url = CacheKey::public_url(&self.settings.public_base_url, &key);

        if self.cache.contains(&key).await {
            debug!("缓存命中: {} -> {}", url, key);
            return ResizeResult::success(public_url, true);
        }

        if strategy == Strategy::FireAndWait && is_jpeg_url(url) {
            // 乐观快速路径：立即返回成功，抓取与缩放在后台完成后写入缓存
            let dispatcher = self.clone();
            let url = url.to_string();
            tokio::spawn(async move {
                if let Err(e) = dispatcher.resolve(&url, &key, width, height, strategy).await {
                    warn!("后台缩放失败: {} - 错误: {}", url, e);
                }
            });
            return ResizeResult::success(public_url, false);
        }

        match self.resolve(url, &key, width, height, strategy).await {
            Ok(Resolved::Cached) => ResizeResult::success(public_url, true),
            Ok(Resolved::Fresh) | Ok(Resolved::Shared) => ResizeResult::success(public_url, false),
            Err(e) => {
                warn!("缩放失败: {} - 错误: {}", url, e);
                ResizeResult::failure()
            }
        }
    }

    /// 通过共享计算解析一个键
    async fn resolve(
        &self,
        url: &str,
        key: &str,
        width: u32,
        height: u32,
        strategy: Strategy,
    ) -> Result<Resolved, ResizeError> {
        let guard = match self.flights.register(key) {
            Flight::Leader(guard) => guard,
            Flight::Follower(rx) => {
                let outcome = if strategy == Strategy::BoundedWait {
                    // 共享计算同样受有限等待的超时约束
                    let limit = self.settings.resize_timeout;
                    match timeout(limit, wait_for_leader(rx)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!("等待共享缩放超时 ({:?}): {}", limit, url);
                            return Err(ResizeError::Timeout(limit));
                        }
                    }
                } else {
                    wait_for_leader(rx).await
                };
                return outcome.map(|_| Resolved::Shared).map_err(ResizeError::Flight);
            }
        };

        // 上一个计算可能刚刚在检查缓存与注册之间完成
        if let Some(data) = self.cache.get(key).await {
            guard.complete(Ok(data));
            return Ok(Resolved::Cached);
        }

        match self.run_pipeline(url, width, height, strategy).await {
            Ok(data) => {
                let data = Bytes::from(data);
                info!("写入缓存: {} ({} 字节)", key, data.len());
                self.cache.add(key, data.clone()).await;
                guard.complete(Ok(data));
                Ok(Resolved::Fresh)
            }
            Err(e) => {
                guard.complete(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// 抓取 -> 解码 -> 缩放 -> 编码
    async fn run_pipeline(
        &self,
        url: &str,
        width: u32,
        height: u32,
        strategy: Strategy,
    ) -> Result<Vec<u8>, ResizeError> {
        let data = self.fetcher.fetch(url).await?;

        match strategy {
            Strategy::Synchronous => Ok(self.transformer.transform(&data, width, height)?),
            Strategy::FireAndWait => {
                let image = self.transformer.decode(&data)?;
                let rx = spawn_resize(
                    Arc::clone(&self.transformer),
                    TransformTask { width, height, image },
                );
                let resized = await_resize(rx).await?;
                Ok(self.transformer.encode(&resized)?)
            }
            Strategy::BoundedWait => {
                let image = self.transformer.decode(&data)?;
                let rx = spawn_resize(
                    Arc::clone(&self.transformer),
                    TransformTask { width, height, image },
                );
                let limit = self.settings.resize_timeout;
                match timeout(limit, await_resize(rx)).await {
                    Ok(resized) => Ok(self.transformer.encode(&resized?)?),
                    Err(_) => {
                        warn!("缩放超时 ({:?}): {}", limit, url);
                        Err(ResizeError::Timeout(limit))
                    }
                }
            }
        }
    }
}

/// URL 路径是否以 `.jpeg` 结尾（区分大小写）
pub fn is_jpeg_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with(".jpeg"),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .ends_with(".jpeg"),
    }
}
