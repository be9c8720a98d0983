use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::assertion::AssertionResult;
use crate::runner::TestResult;
use crate::{Result, SpecError};

/// 报告输出的实现，由 `Reporter::add` 注册
pub trait ReportSink: Send {
    /// suite 开始执行
    fn on_suite_start(&mut self, _suite: &str, _total: usize) {}

    /// 每一条断言结果（通过与失败都会收到）
    fn on_assertion(&mut self, test_name: &str, result: &AssertionResult);

    /// 一个用例执行完毕
    fn on_test(&mut self, _result: &TestResult) {}

    /// 运行结束，输出/写入报告
    fn end(&mut self) -> Result<()>;
}

/// Reporter 生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterPhase {
    Uninitialized,
    Active,
    Finalized,
}

enum State {
    Uninitialized,
    Active(Vec<Box<dyn ReportSink>>),
    Finalized,
}

/// 全局结果收集器：Uninitialized -> Active -> Finalized
///
/// 多个并发 suite 共享同一个 `Arc<Reporter>`
pub struct Reporter {
    state: Mutex<State>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Uninitialized),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> ReporterPhase {
        match &*self.lock() {
            State::Uninitialized => ReporterPhase::Uninitialized,
            State::Active(_) => ReporterPhase::Active,
            State::Finalized => ReporterPhase::Finalized,
        }
    }

    /// 注册一个 sink。首次注册进入 Active，Active 时可继续追加
    pub fn add(&self, sink: impl ReportSink + 'static) -> Result<()> {
        self.add_boxed(Box::new(sink))
    }

    pub fn add_boxed(&self, sink: Box<dyn ReportSink>) -> Result<()> {
        let mut state = self.lock();
        if let State::Active(sinks) = &mut *state {
            sinks.push(sink);
            return Ok(());
        }
        if matches!(*state, State::Finalized) {
            return Err(SpecError::ReporterFinalized);
        }

        *state = State::Active(vec![sink]);
        Ok(())
    }

    pub fn suite_started(&self, suite: &str, total: usize) {
        if let State::Active(sinks) = &mut *self.lock() {
            for sink in sinks.iter_mut() {
                sink.on_suite_start(suite, total);
            }
        }
    }

    /// 转发一条断言结果；非 Active 状态下丢弃
    pub fn record(&self, test_name: &str, result: &AssertionResult) {
        match &mut *self.lock() {
            State::Active(sinks) => {
                for sink in sinks.iter_mut() {
                    sink.on_assertion(test_name, result);
                }
            }
            _ => warn!(test = test_name, assertion = %result.raw, "reporter not active, result dropped"),
        }
    }

    pub fn record_test(&self, result: &TestResult) {
        if let State::Active(sinks) = &mut *self.lock() {
            for sink in sinks.iter_mut() {
                sink.on_test(result);
            }
        }
    }

    /// 结束报告。未启动时报错，重复调用为空操作
    ///
    /// 即使某个 sink 写出失败，状态也会进入 Finalized，返回第一个错误
    pub fn end(&self) -> Result<()> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, State::Finalized) {
            State::Uninitialized => {
                *state = State::Uninitialized;
                Err(SpecError::ReporterNotStarted)
            }
            State::Finalized => Ok(()),
            State::Active(mut sinks) => {
                let mut first_error = None;
                for sink in sinks.iter_mut() {
                    if let Err(e) = sink.end() {
                        warn!("Failed to finalize report: {}", e);
                        first_error.get_or_insert(e);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone)]
    struct Recorded {
        assertions: Arc<Mutex<Vec<(String, bool)>>>,
        ends: Arc<Mutex<usize>>,
    }

    struct RecordingSink(Recorded);

    impl ReportSink for RecordingSink {
        fn on_assertion(&mut self, test_name: &str, result: &AssertionResult) {
            self.0
                .assertions
                .lock()
                .unwrap()
                .push((test_name.to_string(), result.passed));
        }

        fn end(&mut self) -> Result<()> {
            *self.0.ends.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn passed(raw: &str) -> AssertionResult {
        AssertionResult::success(raw.to_string(), "200".to_string(), "200".to_string())
    }

    #[test]
    fn test_lifecycle() {
        let reporter = Reporter::new();
        assert_eq!(reporter.phase(), ReporterPhase::Uninitialized);

        let recorded = Recorded::default();
        reporter.add(RecordingSink(recorded.clone())).unwrap();
        assert_eq!(reporter.phase(), ReporterPhase::Active);

        reporter.record("Cria um novo produto", &passed("status == 201"));
        reporter.end().unwrap();
        assert_eq!(reporter.phase(), ReporterPhase::Finalized);

        assert_eq!(
            *recorded.assertions.lock().unwrap(),
            vec![("Cria um novo produto".to_string(), true)]
        );
    }

    #[test]
    fn test_end_twice_finalizes_once() {
        let reporter = Reporter::new();
        let recorded = Recorded::default();
        reporter.add(RecordingSink(recorded.clone())).unwrap();

        reporter.end().unwrap();
        reporter.end().unwrap();
        assert_eq!(*recorded.ends.lock().unwrap(), 1);
        assert_eq!(reporter.phase(), ReporterPhase::Finalized);
    }

    #[test]
    fn test_end_before_add() {
        let reporter = Reporter::new();
        assert!(matches!(reporter.end(), Err(SpecError::ReporterNotStarted)));
        assert_eq!(reporter.phase(), ReporterPhase::Uninitialized);
    }

    #[test]
    fn test_record_before_add_is_dropped() {
        let reporter = Reporter::new();
        reporter.record("t", &passed("status == 200"));

        let recorded = Recorded::default();
        reporter.add(RecordingSink(recorded.clone())).unwrap();
        assert!(recorded.assertions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_multiple_sinks_and_add_after_end() {
        let reporter = Reporter::new();
        let first = Recorded::default();
        let second = Recorded::default();
        reporter.add(RecordingSink(first.clone())).unwrap();
        reporter.add(RecordingSink(second.clone())).unwrap();

        reporter.record("t", &passed("status == 200"));
        assert_eq!(first.assertions.lock().unwrap().len(), 1);
        assert_eq!(second.assertions.lock().unwrap().len(), 1);

        reporter.end().unwrap();
        assert!(matches!(
            reporter.add(RecordingSink(Recorded::default())),
            Err(SpecError::ReporterFinalized)
        ));
    }
}
