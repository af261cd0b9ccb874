use serde::{Deserialize, Serialize};

/// 批量缩放请求
///
/// `urls` 按顺序处理，允许重复，每个 URL 独立处理。
/// 宽或高为 0 时按原图宽高比推导。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResizeRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ResizeRequest {
    pub fn new(urls: Vec<String>, width: u32, height: u32) -> Self {
        Self { urls, width, height }
    }
}

/// 单个 URL 的处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStatus {
    Success,
    Failure,
}

/// 单个 URL 的处理结果
///
/// `url` 只在成功时有意义，失败时为空字符串。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResizeResult {
    pub url: String,
    pub result: ResizeStatus,
    pub cached: bool,
}

impl ResizeResult {
    /// 成功结果
    pub fn success(url: String, cached: bool) -> Self {
        Self {
            url,
            result: ResizeStatus::Success,
            cached,
        }
    }

    /// 失败结果（不暴露错误细节）
    pub fn failure() -> Self {
        Self {
            url: String::new(),
            result: ResizeStatus::Failure,
            cached: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ResizeStatus::Success
    }
}

/// 执行策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// 派生缩放任务并等待；`.jpeg` 结尾的 URL 走乐观快速路径
    FireAndWait,
    /// 派生缩放任务，最多等待固定超时
    BoundedWait,
    /// 在当前任务内同步完成
    Synchronous,
}

impl Strategy {
    /// 从选择器字符串解析（精确匹配，其他值都走同步策略）
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "true" => Strategy::FireAndWait,
            "false" => Strategy::BoundedWait,
            _ => Strategy::Synchronous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FireAndWait => "fire_and_wait",
            Strategy::BoundedWait => "bounded_wait",
            Strategy::Synchronous => "synchronous",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Synchronous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_selector() {
        assert_eq!(Strategy::from_selector("true"), Strategy::FireAndWait);
        assert_eq!(Strategy::from_selector("false"), Strategy::BoundedWait);
        assert_eq!(Strategy::from_selector("default"), Strategy::Synchronous);
        assert_eq!(Strategy::from_selector(""), Strategy::Synchronous);
        // 精确匹配，大小写敏感
        assert_eq!(Strategy::from_selector("TRUE"), Strategy::Synchronous);
    }

    #[test]
    fn test_result_serialization() {
        let result = ResizeResult::success("http://h/v1/image/x.jpeg".to_string(), true);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["result"], "success");
        assert_eq!(json["cached"], true);
        assert_eq!(json["url"], "http://h/v1/image/x.jpeg");

        let json = serde_json::to_value(ResizeResult::failure()).unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["cached"], false);
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: ResizeRequest =
            serde_json::from_str(r#"{"urls": ["http://x/a.png", "http://x/a.png"], "width": 100}"#)
                .unwrap();
        assert_eq!(request.urls.len(), 2);
        assert_eq!(request.width, 100);
        assert_eq!(request.height, 0);
    }
}
