use std::sync::Arc;
use std::time::Duration;

use crate::assertion::AssertionResult;
use crate::http::{Client, default_timeout};
use crate::reporter::Reporter;
use crate::store::ValueStore;
use crate::{Result, SpecError};

/// 一个 suite 的执行上下文：独占的 ValueStore 加共享的 Reporter
pub struct SpecContext {
    client: Client,
    store: ValueStore,
    reporter: Arc<Reporter>,
    base_url: Option<url::Url>,
    default_timeout: Duration,
    current_test: Option<String>,
}

impl SpecContext {
    pub fn new(client: Client, reporter: Arc<Reporter>) -> Self {
        Self {
            client,
            store: ValueStore::new(),
            reporter,
            base_url: None,
            default_timeout: default_timeout(),
            current_test: None,
        }
    }

    /// 以 `/` 开头的 URL 会拼接到 base_url 之后
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(url::Url::parse(base_url.trim())?);
        Ok(self)
    }

    /// 全局默认超时（对应 setDefaultTimeout）
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_store(mut self, store: ValueStore) -> Self {
        self.store = store;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ValueStore {
        &mut self.store
    }

    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn base_url(&self) -> Option<&url::Url> {
        self.base_url.as_ref()
    }

    /// 标记当前用例名称，之后的断言结果都归到该用例下
    pub fn begin_test(&mut self, name: impl Into<String>) {
        self.current_test = Some(name.into());
    }

    pub fn current_test(&self) -> Option<&str> {
        self.current_test.as_deref()
    }

    pub(crate) fn report(&self, test_name: &str, result: &AssertionResult) {
        self.reporter.record(test_name, result);
    }

    /// 将模板（已替换占位符）解析为绝对 URL
    pub fn resolve_url(&self, url: &str) -> Result<url::Url> {
        let url = url.trim();
        if url.starts_with('/') {
            let base = self.base_url.as_ref().ok_or_else(|| {
                SpecError::InvalidUrl(format!("relative URL '{}' requires a base_url", url))
            })?;
            let joined = format!("{}{}", base.as_str().trim_end_matches('/'), url);
            Ok(url::Url::parse(&joined)?)
        } else {
            Ok(url::Url::parse(url)?)
        }
    }
}
