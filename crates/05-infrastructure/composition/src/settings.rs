//! 启动配置

use config_impl::REMOTE_CONFIG_PROVIDER_NAME;
use infrastructure_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认启动配置文件（不含扩展名）
pub const DEFAULT_SETTINGS_FILE: &str = "config/remote";

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "REMOTE_CONFIG";

/// 启动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSettings {
    /// 配置源地址
    pub source_uri: String,
    /// 是否监听变更
    #[serde(default = "default_watch")]
    pub watch: bool,
    /// 协议未匹配时使用的提供者
    #[serde(default = "default_provider")]
    pub provider: String,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_watch() -> bool {
    true
}

fn default_provider() -> String {
    REMOTE_CONFIG_PROVIDER_NAME.to_string()
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// 日志级别或过滤表达式
    #[serde(default = "default_level")]
    pub level: String,
    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json: bool,
    /// 是否显示目标
    #[serde(default = "default_show_target")]
    pub show_target: bool,
    /// 是否显示线程ID
    #[serde(default)]
    pub show_thread_ids: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_show_target() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            show_target: default_show_target(),
            show_thread_ids: false,
        }
    }
}

impl LoggingSettings {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json: false,
            show_target: true,
            show_thread_ids: true,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            show_target: false,
            show_thread_ids: false,
        }
    }
}

/// 启动配置加载器
///
/// 依次叠加：配置文件（可选）、环境变量、显式覆盖值，后者优先。
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: PathBuf,
    file_required: bool,
    env_prefix: String,
    overrides: Vec<(String, config::Value)>,
}

impl SettingsLoader {
    /// 创建使用默认文件和默认前缀的加载器
    pub fn new() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            file_required: false,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            overrides: Vec::new(),
        }
    }

    /// 指定配置文件，显式指定的文件必须存在
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = path.as_ref().to_path_buf();
        self.file_required = true;
        self
    }

    /// 设置环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 添加覆盖值
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<config::Value>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// 加载启动配置
    pub fn load(&self) -> Result<BootstrapSettings, ConfigError> {
        debug!(
            "加载启动配置: file={}, env_prefix={}",
            self.file.display(),
            self.env_prefix
        );

        let file_name = self.file.to_string_lossy();
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(&file_name).required(self.file_required))
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key.as_str(), value.clone())
                .map_err(settings_error)?;
        }

        let settings: BootstrapSettings = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(settings_error)?;

        if settings.source_uri.trim().is_empty() {
            return Err(ConfigError::MissingParameter { name: "source_uri" });
        }
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn settings_error(e: config::ConfigError) -> ConfigError {
    ConfigError::SettingsError {
        source: Box::new(e),
    }
}
