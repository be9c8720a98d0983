pub mod executor;
pub mod types;

pub use executor::SuiteRunner;
pub use types::{Outcome, TestResult, TestSummary};
