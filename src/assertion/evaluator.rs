use serde_json::Value;

use crate::assertion::json_like::json_like;
use crate::assertion::schema::validate_schema;
use crate::assertion::types::{AssertError, AssertionResult, Expectation};
use crate::http::Response;
use crate::store::FieldPath;

/// 对同一个响应求值所有期望，不短路
pub fn evaluate_all(expectations: &[Expectation], response: &Response) -> Vec<AssertionResult> {
    expectations
        .iter()
        .map(|expectation| evaluate_expectation(expectation, response))
        .collect()
}

/// 执行断言求值
pub fn evaluate_expectation(expectation: &Expectation, response: &Response) -> AssertionResult {
    let raw = expectation.to_string();

    match expectation {
        Expectation::Status(expected) => {
            let actual = response.status.code();
            if actual == *expected {
                AssertionResult::success(raw, actual.to_string(), expected.to_string())
            } else {
                AssertionResult::failure(
                    raw,
                    Some(actual.to_string()),
                    expected.to_string(),
                    AssertError::StatusMismatch {
                        expected: *expected,
                        actual,
                    },
                )
            }
        }

        Expectation::JsonLike(expected) => {
            let Some(actual) = response.json.as_ref() else {
                return not_json(raw, response, expected.to_string());
            };

            match json_like(expected, actual) {
                Ok(()) => AssertionResult::success(raw, actual.to_string(), expected.to_string()),
                Err(e) => {
                    AssertionResult::failure(raw, Some(actual.to_string()), expected.to_string(), e)
                }
            }
        }

        Expectation::JsonLength { path, expected } => {
            let Some(root) = response.json.as_ref() else {
                return not_json(raw, response, expected.to_string());
            };

            let target = match target_at(root, path.as_deref()) {
                Ok(target) => target,
                Err(e) => return AssertionResult::failure(raw, None, expected.to_string(), e),
            };

            match target.as_array().map(Vec::len) {
                Some(len) if len == *expected => {
                    AssertionResult::success(raw, len.to_string(), expected.to_string())
                }
                actual => AssertionResult::failure(
                    raw,
                    actual.map(|len| len.to_string()),
                    expected.to_string(),
                    AssertError::LengthMismatch {
                        expected: *expected,
                        actual,
                    },
                ),
            }
        }

        Expectation::JsonSchema(schema) => {
            let Some(actual) = response.json.as_ref() else {
                return not_json(raw, response, "schema".to_string());
            };

            let violations = validate_schema(schema, actual);
            if violations.is_empty() {
                AssertionResult::success(raw, "valid".to_string(), "schema".to_string())
            } else {
                AssertionResult::failure(
                    raw,
                    Some(format!("{} violation(s)", violations.len())),
                    "schema".to_string(),
                    AssertError::SchemaMismatch { violations },
                )
            }
        }
    }
}

fn target_at<'a>(root: &'a Value, path: Option<&str>) -> Result<&'a Value, AssertError> {
    let Some(path) = path else {
        return Ok(root);
    };
    let path = FieldPath::parse(path).map_err(|_| AssertError::InvalidPath(path.to_string()))?;
    path.lookup(root)
        .ok_or_else(|| AssertError::PathNotFound(path.to_string()))
}

fn not_json(raw: String, response: &Response, expected: String) -> AssertionResult {
    let body = if response.body.is_empty() {
        "<empty body>".to_string()
    } else {
        response.body.clone()
    };
    AssertionResult::failure(raw, Some(body), expected, AssertError::NotJson)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use std::time::Duration;

    fn create_test_response(status: u16, body: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        Response::new(status, headers, body.to_string(), Duration::from_millis(100)).unwrap()
    }

    fn length(expected: usize) -> Expectation {
        Expectation::JsonLength {
            path: None,
            expected,
        }
    }

    #[test]
    fn test_evaluate_status_success() {
        let result = evaluate_expectation(&Expectation::Status(201), &create_test_response(201, "{}"));
        assert!(result.passed);
        assert_eq!(result.actual, Some("201".to_string()));
    }

    #[test]
    fn test_evaluate_status_failure() {
        let result = evaluate_expectation(&Expectation::Status(200), &create_test_response(404, "{}"));
        assert!(!result.passed);
        assert_eq!(
            result.error,
            Some(AssertError::StatusMismatch {
                expected: 200,
                actual: 404
            })
        );
        assert!(result.message.is_some());
    }

    #[test]
    fn test_evaluate_json_like() {
        let response = create_test_response(200, r#"{"id": 5, "title": "X", "price": 10}"#);

        let result = evaluate_expectation(&Expectation::JsonLike(json!({"title": "X"})), &response);
        assert!(result.passed);

        let result = evaluate_expectation(&Expectation::JsonLike(json!({"title": "Y"})), &response);
        assert!(!result.passed);
        assert_eq!(result.kind(), Some("JsonMismatchError"));
    }

    #[test]
    fn test_evaluate_json_length_exact() {
        let response = create_test_response(200, "[1, 2, 3]");

        assert!(evaluate_expectation(&length(3), &response).passed);

        let below = evaluate_expectation(&length(2), &response);
        let above = evaluate_expectation(&length(4), &response);
        assert!(!below.passed);
        assert!(!above.passed);
        assert_eq!(
            above.error,
            Some(AssertError::LengthMismatch {
                expected: 4,
                actual: Some(3)
            })
        );
    }

    #[test]
    fn test_evaluate_json_length_non_array() {
        let result = evaluate_expectation(&length(1), &create_test_response(200, r#"{"a": 1}"#));
        assert_eq!(
            result.error,
            Some(AssertError::LengthMismatch {
                expected: 1,
                actual: None
            })
        );
    }

    #[test]
    fn test_evaluate_json_length_at_path() {
        let response = create_test_response(200, r#"{"data": {"items": [1, 2]}}"#);
        let expectation = Expectation::JsonLength {
            path: Some("data.items".to_string()),
            expected: 2,
        };
        assert!(evaluate_expectation(&expectation, &response).passed);

        let expectation = Expectation::JsonLength {
            path: Some("data.missing".to_string()),
            expected: 2,
        };
        let result = evaluate_expectation(&expectation, &response);
        assert_eq!(
            result.error,
            Some(AssertError::PathNotFound("data.missing".to_string()))
        );
    }

    #[test]
    fn test_evaluate_schema() {
        let schema = json!({"type": "array", "items": {"type": "object"}});
        let passed = evaluate_expectation(
            &Expectation::JsonSchema(schema.clone()),
            &create_test_response(200, r#"[{"id": 1}]"#),
        );
        assert!(passed.passed);

        let failed = evaluate_expectation(
            &Expectation::JsonSchema(schema),
            &create_test_response(200, r#"[1]"#),
        );
        assert_eq!(failed.kind(), Some("SchemaMismatchError"));
    }

    #[test]
    fn test_json_expectation_on_non_json_body() {
        let result = evaluate_expectation(
            &Expectation::JsonLike(json!({"a": 1})),
            &create_test_response(500, "Internal Server Error"),
        );
        assert!(!result.passed);
        assert_eq!(result.error, Some(AssertError::NotJson));
        assert_eq!(result.actual, Some("Internal Server Error".to_string()));
    }

    #[test]
    fn test_evaluate_all_does_not_short_circuit() {
        let expectations = vec![
            Expectation::Status(201),
            Expectation::JsonLike(json!({"name": "Livros"})),
            length(0),
        ];
        let results = evaluate_all(&expectations, &create_test_response(400, r#"{"name": "x"}"#));

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.passed));
    }
}
