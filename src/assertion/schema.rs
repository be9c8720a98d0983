//! 简化版 JSON Schema 校验
//!
//! 只识别 `type`、`items`、`properties`、`required` 四个关键字，其余关键字
//! 与未知的类型名一律忽略。这是有意的放宽，不等同于完整的 JSON Schema 校验。

use serde_json::Value;

/// 校验 `actual` 是否符合 `schema`，返回所有违规描述（为空表示通过）
pub fn validate_schema(schema: &Value, actual: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    check("$", schema, actual, &mut violations);
    violations
}

fn check(path: &str, schema: &Value, actual: &Value, violations: &mut Vec<String>) {
    // 非对象 schema（如 true/false）不做约束
    let Value::Object(schema) = schema else {
        return;
    };

    if let Some(expected_type) = schema.get("type")
        && !type_matches(expected_type, actual)
    {
        violations.push(format!(
            "{}: expected type {}, got {}",
            path,
            describe_type(expected_type),
            type_name(actual)
        ));
        return;
    }

    if let (Some(items), Value::Array(elements)) = (schema.get("items"), actual) {
        for (index, element) in elements.iter().enumerate() {
            check(&format!("{}[{}]", path, index), items, element, violations);
        }
    }

    if let Value::Object(object) = actual {
        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (key, property_schema) in properties {
                if let Some(value) = object.get(key) {
                    check(&format!("{}.{}", path, key), property_schema, value, violations);
                }
            }
        }

        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    violations.push(format!("{}: missing required property '{}'", path, name));
                }
            }
        }
    }
}

/// `type` 可以是字符串，也可以是字符串数组（满足其一即可）
fn type_matches(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::String(name) => single_type_matches(name, actual),
        Value::Array(names) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            names.is_empty() || names.iter().any(|name| single_type_matches(name, actual))
        }
        _ => true,
    }
}

fn single_type_matches(name: &str, actual: &Value) -> bool {
    match name {
        "object" => actual.is_object(),
        "array" => actual.is_array(),
        "string" => actual.is_string(),
        "number" => actual.is_number(),
        "integer" => {
            actual.is_i64()
                || actual.is_u64()
                || actual.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => actual.is_boolean(),
        "null" => actual.is_null(),
        // 未知类型名忽略
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn category_schema() -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "id": {"type": "number"},
                    "name": {"type": "string"},
                    "image": {"type": "string"}
                }
            }
        })
    }

    #[test]
    fn test_valid_array_of_objects() {
        let actual = json!([
            {"id": 1, "name": "Clothes", "image": "https://i.imgur.com/QkIa5tT.jpeg"},
            {"id": 2, "name": "Electronics", "image": "https://i.imgur.com/ZANVnHE.jpeg", "slug": "electronics"}
        ]);
        assert!(validate_schema(&category_schema(), &actual).is_empty());
    }

    #[test]
    fn test_wrong_root_type() {
        let violations = validate_schema(&category_schema(), &json!({"id": 1}));
        assert_eq!(violations, vec!["$: expected type array, got object"]);
    }

    #[test]
    fn test_collects_every_violation() {
        let actual = json!([
            {"id": "1", "name": "Clothes", "image": "x"},
            {"id": 2, "name": 3, "image": null}
        ]);
        let mut violations = validate_schema(&category_schema(), &actual);
        violations.sort();
        assert_eq!(
            violations,
            vec![
                "$[0].id: expected type number, got string",
                "$[1].image: expected type string, got null",
                "$[1].name: expected type string, got number",
            ]
        );
    }

    #[test]
    fn test_nested_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "category": {"type": "object", "properties": {"id": {"type": "number"}}}
            }
        });
        assert!(validate_schema(&schema, &json!({"category": {"id": 1}})).is_empty());
        assert_eq!(
            validate_schema(&schema, &json!({"category": {"id": "1"}})),
            vec!["$.category.id: expected type number, got string"]
        );
    }

    #[test]
    fn test_unknown_keywords_ignored() {
        let schema = json!({
            "type": "string",
            "minLength": 100,
            "format": "email",
            "pattern": "^x$"
        });
        assert!(validate_schema(&schema, &json!("a@b.com")).is_empty());

        let schema = json!({"type": "uuid"});
        assert!(validate_schema(&schema, &json!(12)).is_empty());
    }

    #[test]
    fn test_required() {
        let schema = json!({"type": "object", "required": ["id", "email"]});
        assert_eq!(
            validate_schema(&schema, &json!({"id": 1})),
            vec!["$: missing required property 'email'"]
        );
    }

    #[test]
    fn test_integer_and_type_union() {
        assert!(validate_schema(&json!({"type": "integer"}), &json!(3)).is_empty());
        assert!(!validate_schema(&json!({"type": "integer"}), &json!(3.5)).is_empty());
        assert!(validate_schema(&json!({"type": ["string", "null"]}), &json!(null)).is_empty());
    }
}
