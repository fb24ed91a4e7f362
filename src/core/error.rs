//! 错误处理体系 (Error Handling System)
//!
//! 定义检索/下载链路的领域错误类型以及全局 Result 别名。

use reqwest::StatusCode;
use thiserror::Error;

/// 全局错误定义 (Scout Domain Errors)
#[derive(Error, Debug)]
pub enum ScoutError {
    /// 调用方输入非法 (空查询、缺失参数)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 页面导航失败或超时
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// 上游返回非 2xx 状态
    #[error("Upstream {url} responded {status}")]
    UpstreamStatus { url: String, status: StatusCode },

    /// 浏览器实例/页面的启动与关闭异常
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// 所有下载入口候选均未命中
    #[error("Could not find a valid download link on {0}")]
    NoDownloadLink(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Form encoding error: {0}")]
    FormEncoding(#[from] serde_urlencoded::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    pub fn navigation(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// 是否属于调用方过错 (映射为 4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScoutError::Validation(_))
    }
}
