use std::collections::BTreeMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::spec::Spec;

/// suite 文件加载错误
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {location}: {message}")]
    Parse { location: String, message: String },

    #[error("Invalid case #{index} in {location}: {message}")]
    InvalidCase {
        location: String,
        index: usize,
        message: String,
    },
}

/// suite 文件的原始结构
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteDocument {
    pub name: String,

    /// 按文件顺序预置，后面的值可以引用前面的
    #[serde(default)]
    pub values: IndexMap<String, Value>,

    #[serde(default, rename = "case")]
    pub cases: Vec<CaseDocument>,
}

/// `[[case]]` 表
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseDocument {
    pub name: String,
    pub method: String,
    pub url: String,

    pub json: Option<Value>,

    #[serde(default)]
    pub query: BTreeMap<String, Value>,

    pub timeout_ms: Option<u64>,

    pub expect_status: Option<u16>,
    pub expect_json_like: Option<Value>,
    pub expect_json_length: Option<LengthDocument>,
    pub expect_json_schema: Option<Value>,

    /// 变量名 -> 字段路径
    #[serde(default)]
    pub stores: IndexMap<String, String>,

    #[serde(default)]
    pub inspect: bool,

    #[serde(default)]
    pub skip: bool,
}

/// `expect_json_length = 10` 或 `expect_json_length = { path = "items", expected = 3 }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LengthDocument {
    Count(usize),
    At { path: String, expected: usize },
}

/// 一个可执行的用例
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub name: String,
    pub spec: Spec,
    pub skip: bool,
}

/// 一组按顺序执行、共享 ValueStore 的用例
#[derive(Debug, Clone, Default)]
pub struct Suite {
    pub name: String,

    /// 预置值（允许包含 $S{} 占位符）
    pub values: IndexMap<String, Value>,

    pub cases: Vec<Case>,

    /// 来源文件
    pub source_path: Option<PathBuf>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn case(mut self, name: impl Into<String>, spec: Spec) -> Self {
        self.cases.push(Case {
            name: name.into(),
            spec,
            skip: false,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
