use std::time::Duration;

use reqwest::header::HeaderMap as Headers;
use serde_json::Value;

use crate::http::types::Status;
use crate::store::FieldPath;
use crate::{Result, SpecError};

/// 一次请求得到的响应记录
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: String,
    /// body 能解析为 JSON 时才有值
    pub json: Option<Value>,
    pub duration: Duration,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: String, duration: Duration) -> Result<Self> {
        let json = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };

        Ok(Self {
            status: Status::new(status)?,
            headers,
            body,
            json,
            duration,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// 解析后的 JSON body，不是 JSON 时报错
    pub fn json(&self) -> Result<&Value> {
        self.json
            .as_ref()
            .ok_or_else(|| SpecError::ParseError("response body is not JSON".to_string()))
    }

    /// 取 body 中 `path` 处的值
    pub fn value_at(&self, path: &str) -> Result<&Value> {
        let path = FieldPath::parse(path)?;
        path.lookup(self.json()?)
            .ok_or_else(|| SpecError::PathNotFound(path.to_string()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: &str) -> Response {
        Response::new(200, Headers::new(), body.to_string(), Duration::from_millis(5)).unwrap()
    }

    #[test]
    fn test_json_body_parsed() {
        let resp = response(r#"{"id": 7, "category": {"name": "Livros"}}"#);
        assert_eq!(resp.value_at("id").unwrap(), &json!(7));
        assert_eq!(resp.value_at("category.name").unwrap(), &json!("Livros"));
    }

    #[test]
    fn test_non_json_body() {
        let resp = response("<html></html>");
        assert!(resp.json.is_none());
        assert!(resp.json().is_err());
    }

    #[test]
    fn test_value_at_missing_path() {
        let resp = response(r#"{"id": 7}"#);
        match resp.value_at("name") {
            Err(SpecError::PathNotFound(path)) => assert_eq!(path, "name"),
            other => panic!("expected PathNotFound, got {:?}", other),
        }
    }
}
