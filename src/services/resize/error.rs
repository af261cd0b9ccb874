// 缩放流水线错误类型定义
//
// 定义了抓取、解码、缩放、编码过程中可能出现的各种错误类型。
// 这些错误只用于日志诊断，到达批量结果边界时统一折叠为 success / failure。

use std::time::Duration;
use thiserror::Error;

/// 缩放流水线的统一错误类型
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("抓取错误: {0}")]
    Fetch(#[from] FetchError),

    #[error("转换错误: {0}")]
    Transform(#[from] TransformError),

    #[error("缩放超时 ({0:?})")]
    Timeout(Duration),

    #[error("共享任务失败: {0}")]
    Flight(String),
}

/// 抓取相关错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("HTTP 错误: 状态码 {0}")]
    Status(u16),

    #[error("读取响应体失败: {0}")]
    Read(String),

    #[error("响应体超过上限 {limit} 字节")]
    TooLarge { limit: usize },

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),
}

/// 图片转换相关错误
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("图片解码失败: {0}")]
    Decode(String),

    #[error("图片编码失败: {0}")]
    Encode(String),

    #[error("缩放任务执行失败: {0}")]
    TaskFailed(String),

    #[error("目标尺寸 {width}x{height} 超过像素上限 {limit}")]
    TooLarge { width: u32, height: u32, limit: u64 },
}

// 实现从 reqwest::Error 到 FetchError 的转换
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() {
            if let Some(status) = err.status() {
                return FetchError::Status(status.as_u16());
            }
        }
        if err.is_body() || err.is_decode() {
            FetchError::Read(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ResizeError::from(FetchError::Status(404));
        assert_eq!(error.to_string(), "抓取错误: HTTP 错误: 状态码 404");

        let error = FetchError::TooLarge { limit: 10 };
        assert!(error.to_string().contains("10"));
    }

    #[test]
    fn test_transform_error_conversion() {
        let error: ResizeError = TransformError::Decode("bad".to_string()).into();
        assert!(matches!(error, ResizeError::Transform(TransformError::Decode(_))));

        let error = TransformError::TooLarge { width: 9000, height: 9000, limit: 100 };
        assert_eq!(error.to_string(), "目标尺寸 9000x9000 超过像素上限 100");
    }
}
