use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::config::types::{ConfigOverrides, HarnessConfig, Profile, RunConfig};
use crate::{Result, SpecError};

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    pub const CONFIG_FILE: &'static str = "specpost.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<HarnessConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SpecError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SpecError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/specpost/
    ///
    /// 找不到时返回 None；找到但无法解析时报错
    pub fn find_and_load() -> Result<Option<HarnessConfig>> {
        let cwd = std::env::current_dir().ok();
        let user_dir = dirs::home_dir().map(|home| home.join(".config").join("specpost"));
        Self::load_first(cwd.as_deref(), user_dir.as_deref())
    }

    /// 加载 `find_in` 找到的第一个配置文件
    pub fn load_first(
        start: Option<&Path>,
        fallback: Option<&Path>,
    ) -> Result<Option<HarnessConfig>> {
        match Self::find_in(start, fallback) {
            Some(path) => Self::load_from_path(path).map(Some),
            None => Ok(None),
        }
    }

    /// 从 start 向上逐级查找，最后查找 fallback 目录
    pub fn find_in(start: Option<&Path>, fallback: Option<&Path>) -> Option<PathBuf> {
        let mut current = start.map(Path::to_path_buf);

        while let Some(dir) = current {
            let config_path = dir.join(Self::CONFIG_FILE);
            if config_path.exists() {
                debug!(path = %config_path.display(), "config file found");
                return Some(config_path);
            }
            // 尝试父目录
            current = dir.parent().map(Path::to_path_buf);
        }

        fallback
            .map(|dir| dir.join(Self::CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// 合并配置：顶层默认值 < 环境 < 命令行覆盖
    pub fn build(
        config: &HarnessConfig,
        env_name: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<RunConfig> {
        let mut run = RunConfig::default();
        Self::apply_profile(&mut run, &config.defaults);

        if let Some(name) = env_name {
            let env = config.get_environment(name).ok_or_else(|| {
                SpecError::ConfigError(format!("Unknown environment '{}'", name))
            })?;
            Self::apply_profile(&mut run, env);
        }

        if let Some(base_url) = &overrides.base_url {
            run.base_url = Some(base_url.clone());
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            run.default_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(report) = &overrides.report {
            run.report = Some(report.clone());
        }

        // 解析系统环境变量 ${VAR}
        run.base_url = run.base_url.map(|url| Self::resolve_env_vars(&url));
        for value in run.values.values_mut() {
            Self::resolve_env_in_json(value);
        }

        Ok(run)
    }

    fn apply_profile(run: &mut RunConfig, profile: &Profile) {
        if let Some(base_url) = &profile.base_url {
            run.base_url = Some(base_url.clone());
        }
        if let Some(timeout_ms) = profile.timeout_ms {
            run.default_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(report) = &profile.report {
            run.report = Some(report.clone());
        }
        run.values
            .extend(profile.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// 解析并替换系统环境变量 ${VAR}，未设置的保持原样
    pub fn resolve_env_vars(text: &str) -> String {
        static ENV_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REGEX.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

        re.replace_all(text, |caps: &Captures| {
            let env_name = &caps[1];
            std::env::var(env_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
    }

    fn resolve_env_in_json(value: &mut Value) {
        match value {
            Value::String(s) => *s = Self::resolve_env_vars(s),
            Value::Array(items) => items.iter_mut().for_each(Self::resolve_env_in_json),
            Value::Object(map) => map.values_mut().for_each(Self::resolve_env_in_json),
            _ => {}
        }
    }
}
