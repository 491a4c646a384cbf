//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置源地址无效: {uri}, 原因: {reason}")]
    InvalidSourceUri { uri: String, reason: String },

    #[error("配置源缺少必需参数: {name}")]
    MissingParameter { name: &'static str },

    #[error("远程配置会话启动失败: {endpoint}, 原因: {message}")]
    SessionStartFailed { endpoint: String, message: String },

    #[error("远程配置会话停止失败: {message}")]
    SessionStopFailed { message: String },

    #[error("配置提供者已注册: {name}")]
    ProviderAlreadyRegistered { name: String },

    #[error("配置提供者不存在: {name}")]
    ProviderNotFound { name: String },

    #[error("变更回调已注册，同一会话只允许注册一个回调")]
    CallbackAlreadyRegistered,

    #[error("配置源尚未解析")]
    NotParsed,

    #[error("配置源已解析: {uri}")]
    AlreadyParsed { uri: String },

    #[error("配置源已关闭")]
    AlreadyClosed,

    #[error("配置快照拉取失败: {message}")]
    FetchFailed { message: String },

    #[error("启动配置加载失败: {source}")]
    SettingsError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ConfigError {
    /// 创建无效地址错误
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSourceUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// 创建会话启动失败错误
    pub fn session_start_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionStartFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 是否为启动期致命错误
    ///
    /// 地址格式错误、缺少必需参数、远程会话启动失败时，宿主无法得到可用配置，
    /// 只能终止进程。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidSourceUri { .. }
                | Self::MissingParameter { .. }
                | Self::SessionStartFailed { .. }
                | Self::SettingsError { .. }
        )
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

impl InfrastructureError {
    /// 是否为致命错误
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigError { source } => source.is_fatal(),
            Self::BootstrapFailed { .. } => true,
            Self::ShutdownFailed { .. } => false,
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
