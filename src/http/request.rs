use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::Result;
use crate::http::types::Method;

/// 已解析完占位符、可直接发送的请求描述
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: url::Url,
    pub json: Option<Value>,
    pub query_params: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl Request {
    pub fn new(method: Method, url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            method,
            url: url::Url::parse(url.trim())?,
            json: None,
            query_params: BTreeMap::new(),
            timeout,
        })
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query_params.insert(key.to_string(), value.to_string());
        self
    }

    /// 带 query 参数的完整 URL
    pub fn full_url(&self) -> url::Url {
        let mut url = self.url.clone();
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query_params);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_appends_query() {
        let request = Request::new(
            Method::Get,
            "https://api.example.com/api/v1/products",
            Duration::from_secs(1),
        )
        .unwrap()
        .with_query("offset", "0")
        .with_query("limit", "10");

        assert_eq!(
            request.full_url().as_str(),
            "https://api.example.com/api/v1/products?limit=10&offset=0"
        );
    }

    #[test]
    fn test_full_url_keeps_existing_query() {
        let request = Request::new(
            Method::Get,
            "http://localhost/products?title=x",
            Duration::from_secs(1),
        )
        .unwrap()
        .with_query("price_min", "5");

        assert_eq!(
            request.full_url().as_str(),
            "http://localhost/products?title=x&price_min=5"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(Request::new(Method::Get, "not a url", Duration::from_secs(1)).is_err());
    }
}
