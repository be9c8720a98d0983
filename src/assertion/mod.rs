/// 断言模块 - 对响应记录求值期望
mod evaluator;
mod json_like;
mod schema;
mod types;

pub use evaluator::{evaluate_all, evaluate_expectation};
pub use json_like::json_like;
pub use schema::validate_schema;
pub use types::{AssertError, AssertionResult, Expectation};
