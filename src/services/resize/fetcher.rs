// 图片抓取器 - 通过 HTTP 获取源图片
//
// 本模块提供源图片的抓取功能，包括：
// - 单次 GET 请求（不重试）
// - 非 2xx 状态码视为错误
// - 响应体大小上限（超过上限直接报错，不做静默截断）

use crate::services::resize::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// 默认响应体上限：15 MiB
pub const DEFAULT_FETCH_LIMIT: usize = 15 * 1024 * 1024;

/// 抓取源图片字节的能力
///
/// 调度器只依赖这个接口，测试中可以替换为计数桩。
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 抓取 URL 对应的原始字节
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// 基于 reqwest 的 HTTP 抓取器
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP 客户端（连接池共享）
    client: Client,

    /// 响应体上限（字节）
    limit: usize,
}

impl HttpFetcher {
    /// 创建新的抓取器
    ///
    /// # 参数
    /// - `limit`: 响应体上限（字节）
    /// - `request_timeout`: 单次请求的整体超时
    pub fn new(limit: usize, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::Network(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self { client, limit })
    }

}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("开始抓取: {}", url);

        // 只接受 http / https
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        // response 在任何返回路径上都会被 drop，连接随之归还或关闭
        let mut response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("抓取失败: {} 返回状态码 {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.limit as u64 {
                warn!("响应体声明长度 {} 超过上限 {}: {}", length, self.limit, url);
                return Err(FetchError::TooLarge { limit: self.limit });
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if data.len() + chunk.len() > self.limit {
                warn!("响应体超过上限 {}: {}", self.limit, url);
                return Err(FetchError::TooLarge { limit: self.limit });
            }
            data.extend_from_slice(&chunk);
        }

        debug!("抓取完成: {} ({} 字节)", url, data.len());
        Ok(data)
    }
}
