use thiserror::Error;

use crate::assertion::AssertionResult;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    /// 网络层失败（超时、连接被拒绝、DNS 失败）
    #[error("传输错误: {0}")]
    Transport(String),

    /// 引用了从未 store 过的值
    #[error("未定义的引用: $S{{{0}}}")]
    UnboundReference(String),

    #[error("路径不存在: {0}")]
    PathNotFound(String),

    #[error("无效的字段路径: {0}")]
    InvalidPath(String),

    #[error("Reporter 尚未启动")]
    ReporterNotStarted,

    #[error("Reporter 已经结束")]
    ReporterFinalized,

    /// 一个请求上所有失败的断言
    #[error("{} 个断言失败: {}", count(.results), summarize(.results))]
    AssertionFailure { results: Vec<AssertionResult> },

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

fn count(results: &[AssertionResult]) -> usize {
    results.len()
}

fn summarize(results: &[AssertionResult]) -> String {
    results
        .iter()
        .map(|r| match &r.message {
            Some(msg) => format!("[{}] {}", r.raw, msg),
            None => r.raw.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl SpecError {
    /// 失败类别，供 reporter 输出
    pub fn kind(&self) -> &'static str {
        match self {
            SpecError::Transport(_) => "TransportError",
            SpecError::UnboundReference(_) => "UnboundReferenceError",
            SpecError::ReporterNotStarted => "ReporterNotStartedError",
            SpecError::AssertionFailure { .. } => "AssertionFailure",
            SpecError::PathNotFound(_) | SpecError::InvalidPath(_) => "PathError",
            _ => "Error",
        }
    }
}

impl From<reqwest::Error> for SpecError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpecError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            SpecError::Transport(format!("connection failed: {}", err))
        } else {
            SpecError::Transport(err.to_string())
        }
    }
}

impl From<toml::de::Error> for SpecError {
    fn from(err: toml::de::Error) -> Self {
        SpecError::ParseError(err.to_string())
    }
}

// Add conversion from anyhow::Error
impl From<anyhow::Error> for SpecError {
    fn from(err: anyhow::Error) -> Self {
        SpecError::Other(err.to_string())
    }
}

impl From<crate::suite::SuiteError> for SpecError {
    fn from(err: crate::suite::SuiteError) -> Self {
        SpecError::ParseError(err.to_string())
    }
}

/// Result type for specpost crate
pub type Result<T> = std::result::Result<T, SpecError>;
