use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::http::Method;
use crate::spec::Spec;
use crate::store::value_to_string;
use crate::suite::types::{Case, CaseDocument, LengthDocument, Suite, SuiteDocument, SuiteError};

/// suite 文件加载器
pub struct SuiteLoader;

impl SuiteLoader {
    /// 读取并解析 suite 文件
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Suite, SuiteError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SuiteError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut suite = Self::parse_with_location(&content, &path.display().to_string())?;
        suite.source_path = Some(path.to_path_buf());
        Ok(suite)
    }

    /// 解析 suite 文本
    pub fn parse_str(content: &str) -> Result<Suite, SuiteError> {
        Self::parse_with_location(content, "<inline>")
    }

    fn parse_with_location(content: &str, location: &str) -> Result<Suite, SuiteError> {
        let document: SuiteDocument = toml::from_str(content).map_err(|e| SuiteError::Parse {
            location: location.to_string(),
            message: e.to_string().trim().to_string(),
        })?;

        if document.name.trim().is_empty() {
            return Err(SuiteError::Parse {
                location: location.to_string(),
                message: "suite name must not be empty".to_string(),
            });
        }

        let cases = document
            .cases
            .into_iter()
            .enumerate()
            .map(|(index, case)| {
                build_case(case).map_err(|message| SuiteError::InvalidCase {
                    location: location.to_string(),
                    index: index + 1,
                    message,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Suite {
            name: document.name,
            values: document.values,
            cases,
            source_path: None,
        })
    }
}

fn build_case(case: CaseDocument) -> Result<Case, String> {
    if case.name.trim().is_empty() {
        return Err("case name must not be empty".to_string());
    }
    if case.url.trim().is_empty() {
        return Err(format!("'{}': url must not be empty", case.name));
    }

    let method: Method = case
        .method
        .parse()
        .map_err(|e| format!("'{}': {}", case.name, e))?;

    let mut spec = Spec::new(method, case.url.trim());

    if let Some(json) = case.json {
        spec = spec.with_json(json);
    }

    // 查询参数统一转为字符串，数字 0 -> "0"
    spec = spec.with_query_params(
        case.query
            .iter()
            .map(|(key, value)| (key.clone(), value_to_string(value))),
    );

    if let Some(timeout_ms) = case.timeout_ms {
        spec = spec.with_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(code) = case.expect_status {
        spec = spec.expect_status(code);
    }
    if let Some(partial) = case.expect_json_like {
        spec = spec.expect_json_like(partial);
    }
    match case.expect_json_length {
        Some(LengthDocument::Count(expected)) => spec = spec.expect_json_length(expected),
        Some(LengthDocument::At { path, expected }) => {
            spec = spec.expect_json_length_at(path, expected)
        }
        None => {}
    }
    if let Some(schema) = case.expect_json_schema {
        spec = spec.expect_json_schema(schema);
    }
    for (name, path) in &case.stores {
        spec = spec.stores(name, path);
    }
    if case.inspect {
        spec = spec.inspect();
    }

    Ok(Case {
        name: case.name,
        spec,
        skip: case.skip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Expectation;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SUITE: &str = r#"
name = "CRUD de Produtos"

[values]
email = "test$S{run_ts}@email.com"

[[case]]
name = "Cria um novo produto"
method = "POST"
url = "/products"
json = { title = "Notebook Gamer", price = 2500, categoryId = 1 }
expect_status = 201
expect_json_like = { title = "Notebook Gamer" }
stores = { productId = "id" }

[[case]]
name = "Lista produtos paginados"
method = "get"
url = "/products"
query = { offset = 0, limit = 10 }
timeout_ms = 5000
expect_status = 200
expect_json_length = 10
expect_json_schema = { type = "array", items = { type = "object" } }

[[case]]
name = "Itens do carrinho"
method = "GET"
url = "/carts/$S{cartId}"
expect_json_length = { path = "items", expected = 3 }
skip = true
"#;

    #[test]
    fn test_parse_str() {
        let suite = SuiteLoader::parse_str(SUITE).unwrap();

        assert_eq!(suite.name, "CRUD de Produtos");
        assert_eq!(suite.values.get("email"), Some(&json!("test$S{run_ts}@email.com")));
        assert_eq!(suite.len(), 3);

        let create = &suite.cases[0];
        assert_eq!(create.spec.method(), Method::Post);
        assert_eq!(create.spec.url(), "/products");
        assert_eq!(
            create.spec.json(),
            Some(&json!({"title": "Notebook Gamer", "price": 2500, "categoryId": 1}))
        );
        assert_eq!(create.spec.captures().len(), 1);
        assert_eq!(create.spec.expectations()[0], Expectation::Status(201));
    }

    #[test]
    fn test_query_and_length() {
        let suite = SuiteLoader::parse_str(SUITE).unwrap();

        let list = &suite.cases[1];
        assert_eq!(list.spec.method(), Method::Get);
        assert_eq!(list.spec.query().get("offset").map(String::as_str), Some("0"));
        assert_eq!(list.spec.query().get("limit").map(String::as_str), Some("10"));
        assert_eq!(list.spec.timeout(), Some(Duration::from_millis(5000)));
        assert!(list.spec.expectations().contains(&Expectation::JsonLength {
            path: None,
            expected: 10
        }));

        let cart = &suite.cases[2];
        assert!(cart.skip);
        assert_eq!(
            cart.spec.expectations()[0],
            Expectation::JsonLength {
                path: Some("items".to_string()),
                expected: 3
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = r#"
name = "x"

[[case]]
name = "typo"
method = "GET"
url = "/"
expect_stauts = 200
"#;
        assert!(matches!(
            SuiteLoader::parse_str(content),
            Err(SuiteError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_method() {
        let content = r#"
name = "x"

[[case]]
name = "bad"
method = "FETCH"
url = "/"
"#;
        match SuiteLoader::parse_str(content) {
            Err(SuiteError::InvalidCase { index, message, .. }) => {
                assert_eq!(index, 1);
                assert!(message.contains("FETCH"));
            }
            other => panic!("expected InvalidCase, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_url_rejected() {
        let content = r#"
name = "x"

[[case]]
name = "no url"
method = "GET"
url = "  "
"#;
        assert!(matches!(
            SuiteLoader::parse_str(content),
            Err(SuiteError::InvalidCase { .. })
        ));
    }

    #[test]
    fn test_parse_file_keeps_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SUITE.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let suite = SuiteLoader::parse_file(temp_file.path()).unwrap();
        assert_eq!(suite.source_path.as_deref(), Some(temp_file.path()));
    }

    #[test]
    fn test_parse_missing_file() {
        let err = SuiteLoader::parse_file("/nonexistent/suite.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/suite.toml"));
    }
}
