// 缓存键生成
//
// 提供统一的缓存键生成规则：对源 URL 做 SHA-256，再用 URL 安全的 base64 编码，
// 拼成 `/v1/image/{digest}.jpeg` 形式的路径。该路径同时作为缓存键和对外 URL 的路径部分。

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 缓存键的生成方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// 只使用源 URL，不同尺寸的请求共享同一个缓存条目
    #[default]
    SourceOnly,

    /// 把目标宽高一起纳入哈希
    WithDimensions,
}

impl KeyScheme {
    /// 从配置字符串解析
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" | "source_only" => Some(KeyScheme::SourceOnly),
            "dimensions" | "with_dimensions" => Some(KeyScheme::WithDimensions),
            _ => None,
        }
    }
}

/// 缓存键生成器
pub struct CacheKey;

impl CacheKey {
    /// 图片路由前缀
    pub const PREFIX: &'static str = "/v1/image/";

    /// 输出文件扩展名
    pub const EXTENSION: &'static str = ".jpeg";

    /// 由源 URL 生成缓存键
    ///
    /// 纯函数：无 I/O、无共享状态，相同输入总是得到相同输出。
    ///
    /// # 示例
    /// ```
    /// use image_resizer_backend::services::resize::CacheKey;
    ///
    /// let key = CacheKey::derive_key("http://example.com/a.jpeg");
    /// assert!(key.starts_with("/v1/image/"));
    /// assert!(key.ends_with(".jpeg"));
    /// assert_eq!(key, CacheKey::derive_key("http://example.com/a.jpeg"));
    /// ```
    pub fn derive_key(url: &str) -> String {
        Self::wrap(&Self::digest(url.as_bytes()))
    }

    /// 由源 URL 和目标尺寸生成缓存键
    pub fn derive_variant_key(url: &str, width: u32, height: u32) -> String {
        let material = format!("{}#{}x{}", url, width, height);
        Self::wrap(&Self::digest(material.as_bytes()))
    }

    /// 按方案选择生成方式
    pub fn derive_with(scheme: KeyScheme, url: &str, width: u32, height: u32) -> String {
        match scheme {
            KeyScheme::SourceOnly => Self::derive_key(url),
            KeyScheme::WithDimensions => Self::derive_variant_key(url, width, height),
        }
    }

    /// 从图片路由的文件名部分还原缓存键
    ///
    /// 例如 `abc=.jpeg` -> `/v1/image/abc=.jpeg`
    pub fn from_file_name(file_name: &str) -> Option<String> {
        let id = file_name.strip_suffix(Self::EXTENSION)?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(format!("{}{}{}", Self::PREFIX, id, Self::EXTENSION))
    }

    /// 拼出对外可访问的 URL
    pub fn public_url(base_url: &str, key: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), key)
    }

    fn digest(bytes: &[u8]) -> String {
        let hash = Sha256::digest(bytes);
        URL_SAFE.encode(hash)
    }

    fn wrap(id: &str) -> String {
        format!("{}{}{}", Self::PREFIX, id, Self::EXTENSION)
    }
}
