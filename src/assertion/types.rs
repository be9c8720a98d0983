use std::fmt;

use serde_json::Value;

/// 断言失败原因
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssertError {
    #[error("expected status {expected}, got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("at {path}: expected {expected}, got {}", display_actual(.actual))]
    JsonMismatch {
        path: String,
        expected: Value,
        actual: Option<Value>,
    },

    #[error("expected an array of length {expected}, got {}", display_length(.actual))]
    LengthMismatch {
        expected: usize,
        actual: Option<usize>,
    },

    #[error("schema mismatch: {}", join_violations(.violations))]
    SchemaMismatch { violations: Vec<String> },

    #[error("response body is not JSON")]
    NotJson,

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("undefined reference: $S{{{0}}}")]
    UnboundReference(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn display_actual(actual: &Option<Value>) -> String {
    match actual {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    }
}

fn join_violations(violations: &[String]) -> String {
    violations.join("; ")
}

fn display_length(actual: &Option<usize>) -> String {
    match actual {
        Some(len) => len.to_string(),
        None => "a non-array value".to_string(),
    }
}

impl AssertError {
    pub fn kind(&self) -> &'static str {
        match self {
            AssertError::StatusMismatch { .. } => "StatusMismatchError",
            AssertError::JsonMismatch { .. } => "JsonMismatchError",
            AssertError::LengthMismatch { .. } => "LengthMismatchError",
            AssertError::SchemaMismatch { .. } => "SchemaMismatchError",
            AssertError::NotJson => "JsonMismatchError",
            AssertError::PathNotFound(_) | AssertError::InvalidPath(_) => "PathError",
            AssertError::Transport(_) => "TransportError",
            AssertError::UnboundReference(_) => "UnboundReferenceError",
            AssertError::InvalidRequest(_) => "InvalidRequestError",
        }
    }
}

/// 对一个响应的期望
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// 状态码相等
    Status(u16),
    /// 结构子集匹配
    JsonLike(Value),
    /// 根（或 path 处）为长度恰好为 expected 的数组
    JsonLength {
        path: Option<String>,
        expected: usize,
    },
    /// 简化版 JSON Schema
    JsonSchema(Value),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Status(code) => write!(f, "status == {}", code),
            Expectation::JsonLike(value) => write!(f, "json like {}", value),
            Expectation::JsonLength {
                path: Some(path),
                expected,
            } => write!(f, "json length of {} == {}", path, expected),
            Expectation::JsonLength {
                path: None,
                expected,
            } => write!(f, "json length == {}", expected),
            Expectation::JsonSchema(_) => write!(f, "json matches schema"),
        }
    }
}

/// 断言结果
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionResult {
    /// 断言描述
    pub raw: String,

    /// 是否通过
    pub passed: bool,

    /// 实际值（字符串表示）
    pub actual: Option<String>,

    /// 期望描述
    pub expected: String,

    /// 失败消息
    pub message: Option<String>,

    /// 失败原因
    pub error: Option<AssertError>,
}

impl AssertionResult {
    /// 创建成功的断言结果
    pub fn success(raw: String, actual: String, expected: String) -> Self {
        Self {
            raw,
            passed: true,
            actual: Some(actual),
            expected,
            message: None,
            error: None,
        }
    }

    /// 创建失败的断言结果
    pub fn failure(raw: String, actual: Option<String>, expected: String, error: AssertError) -> Self {
        Self {
            raw,
            passed: false,
            actual,
            expected,
            message: Some(error.to_string()),
            error: Some(error),
        }
    }

    /// 请求未能完成时（传输错误、未定义引用）的单条失败
    pub fn aborted(raw: String, error: AssertError) -> Self {
        Self::failure(raw, None, String::new(), error)
    }

    pub fn kind(&self) -> Option<&'static str> {
        self.error.as_ref().map(AssertError::kind)
    }
}
