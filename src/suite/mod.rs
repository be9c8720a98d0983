pub mod loader;
pub mod types;

pub use loader::SuiteLoader;
pub use types::{Case, CaseDocument, LengthDocument, Suite, SuiteDocument, SuiteError};
