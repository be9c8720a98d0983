use serde_json::Value;

use crate::http::Response;
use crate::store::ValueStore;
use crate::{Result, SpecError};

/// 值的捕获来源
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaptureSource {
    /// 从响应 Body 提取（字段路径）
    /// 示例: id, data.token, items[0].id
    Body(String),

    /// 从响应 Header 提取
    /// 示例: header.Location
    Header(String),
}

/// 捕获指令：`stores(name, path)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capture {
    /// 存储名称
    pub name: String,

    /// 捕获来源
    pub source: CaptureSource,
}

impl Capture {
    /// 解析捕获源字符串
    ///
    /// 语法:
    /// - `id` → CaptureSource::Body("id")
    /// - `body.user.id` → CaptureSource::Body("user.id")
    /// - `header.Location` → CaptureSource::Header("Location")
    pub fn parse(name: &str, source: &str) -> Self {
        let source = if let Some(header_name) = source.strip_prefix("header.") {
            CaptureSource::Header(header_name.to_string())
        } else if let Some(path) = source.strip_prefix("body.") {
            CaptureSource::Body(path.to_string())
        } else {
            CaptureSource::Body(source.to_string())
        };

        Self {
            name: name.to_string(),
            source,
        }
    }

    /// 从响应中提取并写入 store
    pub fn apply(&self, response: &Response, store: &mut ValueStore) -> Result<()> {
        match &self.source {
            CaptureSource::Body(path) => {
                store.store(self.name.as_str(), path, response.json()?)?;
            }
            CaptureSource::Header(header_name) => {
                let value = response
                    .header(header_name)
                    .ok_or_else(|| SpecError::PathNotFound(format!("header.{}", header_name)))?;
                store.set(self.name.as_str(), Value::String(value.to_string()));
            }
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        match &self.source {
            CaptureSource::Body(path) => format!("store {} <- {}", self.name, path),
            CaptureSource::Header(name) => format!("store {} <- header.{}", self.name, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use std::time::Duration;

    fn response(body: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("location", "/products/9".parse().unwrap());
        Response::new(201, headers, body.to_string(), Duration::from_millis(1)).unwrap()
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            Capture::parse("productId", "id").source,
            CaptureSource::Body("id".to_string())
        );
        assert_eq!(
            Capture::parse("uid", "body.user.id").source,
            CaptureSource::Body("user.id".to_string())
        );
        assert_eq!(
            Capture::parse("loc", "header.Location").source,
            CaptureSource::Header("Location".to_string())
        );
    }

    #[test]
    fn test_apply_body() {
        let mut store = ValueStore::new();
        Capture::parse("productId", "id")
            .apply(&response(r#"{"id": 9}"#), &mut store)
            .unwrap();
        assert_eq!(store.resolve("productId").unwrap(), &json!(9));
    }

    #[test]
    fn test_apply_header() {
        let mut store = ValueStore::new();
        Capture::parse("loc", "header.Location")
            .apply(&response("{}"), &mut store)
            .unwrap();
        assert_eq!(store.resolve("loc").unwrap(), &json!("/products/9"));
    }

    #[test]
    fn test_apply_missing() {
        let mut store = ValueStore::new();
        let result = Capture::parse("productId", "id").apply(&response("{}"), &mut store);
        assert!(matches!(result, Err(SpecError::PathNotFound(_))));

        let result = Capture::parse("x", "id").apply(&response("not json"), &mut store);
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
