use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::http::{Client, default_timeout};
use crate::reporter::Reporter;
use crate::runner::types::TestResult;
use crate::spec::SpecContext;
use crate::store::Interpolator;
use crate::suite::{Case, Suite};
use crate::{Result, SpecError};

/// 按顺序执行 suite 中的用例，每个 suite 拥有独立的 ValueStore
#[derive(Clone)]
pub struct SuiteRunner {
    client: Client,
    reporter: Arc<Reporter>,
    base_url: Option<String>,
    default_timeout: Duration,
    values: IndexMap<String, Value>,
}

impl SuiteRunner {
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self {
            client: Client::new(),
            reporter,
            base_url: None,
            default_timeout: default_timeout(),
            values: IndexMap::new(),
        }
    }

    pub fn from_config(config: &RunConfig, reporter: Arc<Reporter>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            default_timeout: config.default_timeout,
            values: config.values.clone(),
            ..Self::new(reporter)
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// 执行单个 suite
    ///
    /// 准备阶段（base_url、预置值）失败时，该 suite 的每个用例都记为失败，
    /// 不影响其它 suite
    pub async fn run(&self, suite: &Suite) -> Vec<TestResult> {
        info!(suite = %suite.name, cases = suite.len(), "running suite");
        self.reporter.suite_started(&suite.name, suite.len());

        let prepared = self.context().and_then(|mut ctx| {
            self.seed(suite, &mut ctx)?;
            Ok(ctx)
        });
        let mut ctx = match prepared {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(suite = %suite.name, error = %e, "suite setup failed");
                let results = setup_failures(suite, &e);
                for result in &results {
                    self.reporter.record_test(result);
                }
                return results;
            }
        };

        let mut results = Vec::with_capacity(suite.len());
        for (index, case) in suite.cases.iter().enumerate() {
            let result = self.run_case(&suite.name, index + 1, case, &mut ctx).await;
            self.reporter.record_test(&result);
            results.push(result);
        }

        results
    }

    /// 执行多个 suite；parallel 时并发执行，结果按 suite 顺序返回
    pub async fn run_all(&self, suites: Vec<Suite>, parallel: bool) -> Result<Vec<TestResult>> {
        if !parallel {
            let mut results = Vec::new();
            for suite in &suites {
                results.extend(self.run(suite).await);
            }
            return Ok(results);
        }

        let mut set = JoinSet::new();
        for (index, suite) in suites.into_iter().enumerate() {
            let runner = self.clone();
            set.spawn(async move { (index, runner.run(&suite).await) });
        }

        let mut collected = Vec::new();
        while let Some(joined) = set.join_next().await {
            collected.push(joined.map_err(|e| SpecError::Other(e.to_string()))?);
        }
        collected.sort_by_key(|(index, _)| *index);

        Ok(collected
            .into_iter()
            .flat_map(|(_, results)| results)
            .collect())
    }

    fn context(&self) -> Result<SpecContext> {
        let ctx = SpecContext::new(self.client.clone(), Arc::clone(&self.reporter))
            .with_default_timeout(self.default_timeout);

        match &self.base_url {
            Some(base_url) => ctx.with_base_url(base_url),
            None => Ok(ctx),
        }
    }

    /// 预置值：run_ts -> 配置文件 values -> suite values，按顺序替换占位符
    fn seed(&self, suite: &Suite, ctx: &mut SpecContext) -> Result<()> {
        ctx.store_mut().set("run_ts", json!(unix_millis()));

        for (name, value) in self.values.iter().chain(suite.values.iter()) {
            let resolved = Interpolator::interpolate_json(value, ctx.store())?;
            ctx.store_mut().set(name.clone(), resolved);
        }

        debug!(suite = %suite.name, values = ctx.store().len(), "store seeded");
        Ok(())
    }

    async fn run_case(
        &self,
        suite: &str,
        number: usize,
        case: &Case,
        ctx: &mut SpecContext,
    ) -> TestResult {
        let method = case.spec.method().as_str();

        if case.skip {
            debug!(case = %case.name, "skipped");
            return TestResult::skipped(suite, number, &case.name, method, case.spec.url());
        }

        let mut result = TestResult::new(suite, number, &case.name, method, case.spec.url());
        ctx.begin_test(case.name.as_str());
        let start = Instant::now();

        match case.spec.execute(ctx).await {
            Ok(exchange) => {
                result.url = exchange.request.full_url().to_string();
                result.status = Some(exchange.response.status.code());
                result.duration = exchange.response.duration;

                if !exchange.passed() {
                    let failure = SpecError::AssertionFailure {
                        results: exchange.failures(),
                    };
                    result.fail(failure.kind(), failure.to_string());
                }
                result.assertions = exchange.results;
            }
            Err(e) => {
                result.duration = start.elapsed();
                result.fail(e.kind(), e.to_string());
            }
        }

        result
    }
}

/// suite 无法开始时，为每个用例生成失败结果（跳过的用例保持跳过）
fn setup_failures(suite: &Suite, error: &SpecError) -> Vec<TestResult> {
    let message = format!("suite setup failed: {}", error);

    if suite.is_empty() {
        let mut result = TestResult::new(&suite.name, 0, "(setup)", "", "");
        result.fail(error.kind(), message);
        return vec![result];
    }

    suite
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let method = case.spec.method().as_str();
            if case.skip {
                return TestResult::skipped(
                    &suite.name,
                    index + 1,
                    &case.name,
                    method,
                    case.spec.url(),
                );
            }
            let mut result =
                TestResult::new(&suite.name, index + 1, &case.name, method, case.spec.url());
            result.fail(error.kind(), message.clone());
            result
        })
        .collect()
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
