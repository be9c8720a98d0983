use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::store::path::FieldPath;
use crate::store::types::ValueStore;
use crate::{Result, SpecError};

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\$S\{([^{}]+)\}").unwrap())
}

/// 占位符替换器，语法 `$S{name}` 或 `$S{name.path}`
pub struct Interpolator;

impl Interpolator {
    /// 替换模板中的所有占位符
    ///
    /// 任意一个引用未绑定时立即返回 UnboundReference，不做部分替换
    pub fn interpolate(template: &str, store: &ValueStore) -> Result<String> {
        let re = placeholder_regex();
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in re.captures_iter(template) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = Self::resolve_reference(reference.as_str(), store)?;
            output.push_str(&template[last..whole.start()]);
            output.push_str(&value_to_string(&value));
            last = whole.end();
        }

        output.push_str(&template[last..]);
        Ok(output)
    }

    /// 递归替换 JSON 中所有字符串值里的占位符
    ///
    /// 整个字符串恰好是一个占位符时，替换为带类型的原值
    pub fn interpolate_json(value: &Value, store: &ValueStore) -> Result<Value> {
        match value {
            Value::String(s) => match Self::sole_reference(s) {
                Some(reference) => Self::resolve_reference(reference, store),
                None => Ok(Value::String(Self::interpolate(s, store)?)),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| Self::interpolate_json(item, store))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    resolved.insert(key.clone(), Self::interpolate_json(item, store)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    /// 模板中是否包含占位符
    pub fn has_placeholders(template: &str) -> bool {
        placeholder_regex().is_match(template)
    }

    /// `name` 或 `name.path`，path 用于取结构化值的内部字段
    ///
    /// name 未绑定返回 UnboundReference；name 已绑定但 path 取不到返回 PathNotFound
    fn resolve_reference(reference: &str, store: &ValueStore) -> Result<Value> {
        let reference = reference.trim();
        let split = reference.find(['.', '[']).unwrap_or(reference.len());
        let (name, rest) = reference.split_at(split);

        let value = store.resolve(name)?;
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(value.clone());
        }

        let path = FieldPath::parse(rest)?;
        path.lookup(value)
            .cloned()
            .ok_or_else(|| SpecError::PathNotFound(reference.to_string()))
    }

    fn sole_reference(s: &str) -> Option<&str> {
        let caps = placeholder_regex().captures(s)?;
        let whole = caps.get(0)?;
        if whole.start() == 0 && whole.end() == s.len() {
            caps.get(1).map(|m| m.as_str())
        } else {
            None
        }
    }
}

/// 占位符的字符串形式：字符串原样，其余为紧凑 JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ValueStore {
        let mut store = ValueStore::new();
        store.set("productId", json!(42));
        store.set("email", json!("test@email.com"));
        store.set("user", json!({"id": 7, "tags": ["a", "b"]}));
        store
    }

    #[test]
    fn test_interpolate_simple() {
        let output = Interpolator::interpolate("/products/$S{productId}", &store()).unwrap();
        assert_eq!(output, "/products/42");
    }

    #[test]
    fn test_interpolate_multiple() {
        let output =
            Interpolator::interpolate("$S{email}:$S{productId}:$S{email}", &store()).unwrap();
        assert_eq!(output, "test@email.com:42:test@email.com");
    }

    #[test]
    fn test_interpolate_nested_reference() {
        let store = store();
        assert_eq!(
            Interpolator::interpolate("/users/$S{user.id}", &store).unwrap(),
            "/users/7"
        );
        assert_eq!(
            Interpolator::interpolate("$S{user.tags[1]}", &store).unwrap(),
            "b"
        );
    }

    #[test]
    fn test_interpolate_unbound_fails_fast() {
        let err = Interpolator::interpolate("/a/$S{productId}/b/$S{missing}", &store()).unwrap_err();
        match err {
            SpecError::UnboundReference(name) => assert_eq!(name, "missing"),
            other => panic!("expected UnboundReference, got {:?}", other),
        }
    }

    #[test]
    fn test_interpolate_missing_path_on_bound_value() {
        let err = Interpolator::interpolate("/users/$S{user.missing}", &store()).unwrap_err();
        match err {
            SpecError::PathNotFound(reference) => assert_eq!(reference, "user.missing"),
            other => panic!("expected PathNotFound, got {:?}", other),
        }
        assert_eq!(err_kind("$S{user.tags[5]}"), "PathError");
        assert_eq!(err_kind("$S{nobody.id}"), "UnboundReferenceError");
    }

    fn err_kind(template: &str) -> &'static str {
        Interpolator::interpolate(template, &store()).unwrap_err().kind()
    }

    #[test]
    fn test_interpolate_without_placeholders() {
        let output = Interpolator::interpolate("/categories/1", &ValueStore::new()).unwrap();
        assert_eq!(output, "/categories/1");
        assert!(!Interpolator::has_placeholders("/categories/1"));
        assert!(Interpolator::has_placeholders("/categories/$S{id}"));
    }

    #[test]
    fn test_interpolate_json_typed_and_embedded() {
        let body = json!({
            "categoryId": "$S{productId}",
            "email": "copy-$S{email}",
            "images": ["$S{email}", 1, true],
            "nested": {"owner": "$S{user}"}
        });

        let resolved = Interpolator::interpolate_json(&body, &store()).unwrap();
        assert_eq!(
            resolved,
            json!({
                "categoryId": 42,
                "email": "copy-test@email.com",
                "images": ["test@email.com", 1, true],
                "nested": {"owner": {"id": 7, "tags": ["a", "b"]}}
            })
        );
    }

    #[test]
    fn test_interpolate_json_unbound() {
        let body = json!({"items": [{"id": "$S{nope}"}]});
        assert!(matches!(
            Interpolator::interpolate_json(&body, &store()),
            Err(SpecError::UnboundReference(_))
        ));
    }
}
