use std::time::{Duration, Instant};

use tracing::debug;

use crate::Result;
use crate::http::request::Request;
use crate::http::response::Response;

/// 默认请求超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, Default)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发送请求。网络层失败统一转换为 `SpecError::Transport`
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let url = request.full_url();
        debug!(method = %request.method, url = %url, "sending request");

        let mut req = self
            .inner
            .request(request.method.into(), url)
            .timeout(request.timeout);

        if let Some(json) = &request.json {
            req = req.json(json);
        }

        let start = Instant::now();
        let response = req.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        let duration = start.elapsed();

        debug!(status, elapsed_ms = duration.as_millis() as u64, "response received");
        Response::new(status, headers, body, duration)
    }
}

/// 默认超时
pub fn default_timeout() -> Duration {
    Duration::from_millis(DEFAULT_TIMEOUT_MS)
}
