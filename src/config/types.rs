use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::http::default_timeout;

/// 一组可覆盖的运行设置（顶层或某个环境）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Profile {
    /// 相对 URL 的前缀
    pub base_url: Option<String>,

    /// 默认请求超时（毫秒）
    pub timeout_ms: Option<u64>,

    /// JSON 报告输出路径
    pub report: Option<PathBuf>,

    /// 预置到每个 suite ValueStore 中的值（保持文件中的顺序）
    #[serde(default)]
    pub values: IndexMap<String, Value>,
}

/// 完整的配置文件 specpost.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HarnessConfig {
    #[serde(flatten)]
    pub defaults: Profile,

    /// 所有环境配置
    #[serde(default)]
    pub environments: HashMap<String, Profile>,
}

impl HarnessConfig {
    /// 获取指定环境
    pub fn get_environment(&self, env_name: &str) -> Option<&Profile> {
        self.environments.get(env_name)
    }
}

/// 命令行覆盖项（优先级最高）
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub report: Option<PathBuf>,
}

/// 合并后的最终运行配置
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: Option<String>,
    pub default_timeout: Duration,
    pub report: Option<PathBuf>,
    pub values: IndexMap<String, Value>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_timeout: default_timeout(),
            report: None,
            values: IndexMap::new(),
        }
    }
}
