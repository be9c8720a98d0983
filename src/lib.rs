pub mod assertion;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod reporter;
pub mod runner;
pub mod spec;
pub mod store;
pub mod suite;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, SpecError};
pub use reporter::{ConsoleReporter, JsonFileReporter, ReportSink, Reporter};
pub use runner::{SuiteRunner, TestResult, TestSummary};
pub use spec::{Spec, SpecContext};
pub use store::ValueStore;
pub use suite::{Suite, SuiteLoader};
