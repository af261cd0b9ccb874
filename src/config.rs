// 服务配置
//
// 从环境变量读取服务配置（先由 dotenv 加载 .env），包括：
// - 监听地址与对外 URL 前缀
// - 缓存容量
// - 抓取上限与超时
// - 缩放等待超时与输出像素上限
// - 缓存键方案

use crate::services::resize::{
    KeyScheme, DEFAULT_FETCH_LIMIT, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_OUTPUT_PIXELS,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// 监听地址
    pub host: String,

    /// 监听端口
    pub port: u16,

    /// 对外 URL 前缀（scheme://host:port），结果 URL 为 前缀 + 缓存键
    pub public_base_url: String,

    /// 缓存容量（条目数）
    pub cache_capacity: u64,

    /// 抓取响应体上限（字节）
    pub fetch_limit_bytes: usize,

    /// 单次抓取的整体超时（秒）
    pub fetch_timeout_secs: u64,

    /// 有限等待策略的缩放超时（毫秒）
    pub resize_timeout_ms: u64,

    /// 缓存键方案
    pub key_scheme: KeyScheme,

    /// JPEG 编码质量
    pub jpeg_quality: u8,

    /// 单张输出图片的像素上限（宽 x 高）
    pub max_output_pixels: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_base_url: "http://localhost:8080".to_string(),
            cache_capacity: 1000,
            fetch_limit_bytes: DEFAULT_FETCH_LIMIT,
            fetch_timeout_secs: 30,
            resize_timeout_ms: 3000,
            key_scheme: KeyScheme::SourceOnly,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

impl ServiceConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，无效值回退到默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", &lookup, defaults.port);
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let key_scheme = match lookup("CACHE_KEY_SCHEME") {
            Some(raw) => KeyScheme::parse_name(&raw).unwrap_or_else(|| {
                tracing::warn!("无效的 CACHE_KEY_SCHEME: {}，使用默认值", raw);
                defaults.key_scheme
            }),
            None => defaults.key_scheme,
        };

        Self {
            host,
            port,
            public_base_url,
            cache_capacity: parse_or("CACHE_CAPACITY", &lookup, defaults.cache_capacity),
            fetch_limit_bytes: parse_or("FETCH_LIMIT_BYTES", &lookup, defaults.fetch_limit_bytes),
            fetch_timeout_secs: parse_or("FETCH_TIMEOUT_SECS", &lookup, defaults.fetch_timeout_secs),
            resize_timeout_ms: parse_or("RESIZE_TIMEOUT_MS", &lookup, defaults.resize_timeout_ms),
            key_scheme,
            jpeg_quality: parse_or("JPEG_QUALITY", &lookup, defaults.jpeg_quality),
            max_output_pixels: parse_or("MAX_OUTPUT_PIXELS", &lookup, defaults.max_output_pixels),
        }
    }

    /// 监听地址字符串
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn resize_timeout(&self) -> Duration {
        Duration::from_millis(self.resize_timeout_ms)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("无效的 {}: {}，使用默认值", key, raw);
            default
        }),
        None => default,
    }
}
