use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::store::path::FieldPath;
use crate::{Result, SpecError};

/// 捕获值存储，每个 suite 独占一个实例
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: HashMap<String, Value>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `json` 中提取 `path` 处的值并绑定到 `name`，覆盖旧值
    pub fn store(&mut self, name: impl Into<String>, path: &str, json: &Value) -> Result<&Value> {
        let path = FieldPath::parse(path)?;
        let value = path
            .lookup(json)
            .ok_or_else(|| SpecError::PathNotFound(path.to_string()))?
            .clone();

        Ok(self.set(name, value))
    }

    /// 直接绑定一个值
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &Value {
        let name = name.into();
        debug!(name = %name, value = %value, "value stored");
        self.values.insert(name.clone(), value);
        &self.values[&name]
    }

    /// 获取绑定值，未绑定时返回 UnboundReference
    pub fn resolve(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| SpecError::UnboundReference(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
