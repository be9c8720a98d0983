use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::assertion::AssertionResult;
use crate::reporter::state::ReportSink;
use crate::runner::{Outcome, TestResult, TestSummary};
use crate::{Result, SpecError};

/// 写给 CI 的 JSON 测试报告
pub struct JsonFileReporter {
    path: PathBuf,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    results: Vec<TestResult>,
    assertions: Vec<AssertionRecord>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: TestSummary,
    pub tests: Vec<TestRecord>,
    pub assertions: Vec<AssertionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub suite: String,
    pub name: String,
    pub method: String,
    pub url: String,
    pub outcome: Outcome,
    pub status: Option<u16>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssertionRecord {
    pub test: String,
    pub description: String,
    pub passed: bool,
    pub expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&TestResult> for TestRecord {
    fn from(result: &TestResult) -> Self {
        Self {
            suite: result.suite.clone(),
            name: result.name.clone(),
            method: result.method.clone(),
            url: result.url.clone(),
            outcome: result.outcome,
            status: result.status,
            duration_ms: result.duration.as_millis() as u64,
            error: result.error.clone(),
            error_kind: result.error_kind.clone(),
        }
    }
}

impl JsonFileReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
            assertions: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 当前收集到的内容组成的报告
    pub fn build_report(&self) -> Report {
        Report {
            run_id: self.run_id.to_string(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            summary: TestSummary::from_results(&self.results),
            tests: self.results.iter().map(TestRecord::from).collect(),
            assertions: self.assertions.clone(),
        }
    }

    fn write(&self, report: &Report) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(SpecError::IoError)?;
        }

        let json = serde_json::to_string_pretty(report)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(SpecError::IoError)?;

        // 多个进程可能写同一个报告路径，拿到锁之后才清空旧内容
        file.lock_exclusive().map_err(SpecError::IoError)?;
        file.set_len(0).map_err(SpecError::IoError)?;
        writeln!(file, "{}", json).map_err(SpecError::IoError)?;
        drop(file);

        Ok(())
    }
}

impl ReportSink for JsonFileReporter {
    fn on_assertion(&mut self, test_name: &str, result: &AssertionResult) {
        self.assertions.push(AssertionRecord {
            test: test_name.to_string(),
            description: result.raw.clone(),
            passed: result.passed,
            expected: result.expected.clone(),
            actual: result.actual.clone(),
            kind: result.kind().map(str::to_string),
            message: result.message.clone(),
        });
    }

    fn on_test(&mut self, result: &TestResult) {
        self.results.push(result.clone());
    }

    fn end(&mut self) -> Result<()> {
        let report = self.build_report();
        self.write(&report)?;
        info!(path = %self.path.display(), tests = report.tests.len(), "report written");
        Ok(())
    }
}
