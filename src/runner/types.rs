use std::time::Duration;

use serde::Serialize;

use crate::assertion::AssertionResult;

/// 用例结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// 单个用例的执行结果
#[derive(Debug, Clone)]
pub struct TestResult {
    /// 所属 suite
    pub suite: String,

    /// 用例序号（从 1 开始）
    pub case_number: usize,

    /// 用例名称
    pub name: String,

    /// HTTP 方法
    pub method: String,

    /// 请求 URL（已替换占位符时为替换后的值）
    pub url: String,

    /// 响应状态码（如果收到响应）
    pub status: Option<u16>,

    /// 执行耗时
    pub duration: Duration,

    pub outcome: Outcome,

    /// 错误消息（传输错误、未定义引用、断言失败汇总）
    pub error: Option<String>,

    /// 错误类别
    pub error_kind: Option<String>,

    /// 断言结果列表
    pub assertions: Vec<AssertionResult>,
}

impl TestResult {
    pub fn new(suite: &str, case_number: usize, name: &str, method: &str, url: &str) -> Self {
        Self {
            suite: suite.to_string(),
            case_number,
            name: name.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            status: None,
            duration: Duration::ZERO,
            outcome: Outcome::Passed,
            error: None,
            error_kind: None,
            assertions: Vec::new(),
        }
    }

    pub fn skipped(suite: &str, case_number: usize, name: &str, method: &str, url: &str) -> Self {
        Self {
            outcome: Outcome::Skipped,
            ..Self::new(suite, case_number, name, method, url)
        }
    }

    pub fn fail(&mut self, kind: &str, message: String) {
        self.outcome = Outcome::Failed;
        self.error_kind = Some(kind.to_string());
        self.error = Some(message);
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.outcome == Outcome::Skipped
    }
}

/// 测试摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
    pub total_assertions: usize,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let skipped = results.iter().filter(|r| r.is_skipped()).count();
        let total_duration = results.iter().map(|r| r.duration).sum();

        // 统计断言
        let total_assertions = results.iter().map(|r| r.assertions.len()).sum();
        let passed_assertions = results
            .iter()
            .flat_map(|r| &r.assertions)
            .filter(|a| a.passed)
            .count();

        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed - skipped,
            skipped,
            total_duration,
            total_assertions,
            passed_assertions,
            failed_assertions: total_assertions - passed_assertions,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
