//! 配置源连接描述

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认命名空间
pub const DEFAULT_NAMESPACE: &str = "application";

/// 默认集群
pub const DEFAULT_CLUSTER: &str = "default";

/// 已知的内容格式类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// properties 键值格式
    Properties,
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// TOML
    Toml,
    /// XML
    Xml,
    /// 纯文本
    Text,
    /// 无法识别的格式
    Other,
}

impl FormatKind {
    fn classify(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "properties" => Self::Properties,
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "xml" => Self::Xml,
            "text" | "txt" => Self::Text,
            _ => Self::Other,
        }
    }
}

/// 配置内容格式
///
/// 保留调用方在 `configType` 中给出的原始标签，下游解码器按原样拿回；
/// 识别出的类别只作为附加信息。本层不解析内容。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFormat {
    tag: String,
    kind: FormatKind,
}

impl ContentFormat {
    /// 从 `configType` 参数创建格式，空白标签返回 `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.trim().is_empty() {
            return None;
        }
        Some(Self {
            tag: tag.to_string(),
            kind: FormatKind::classify(tag),
        })
    }

    /// 获取原始格式标签
    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// 获取识别出的格式类别
    pub fn kind(&self) -> FormatKind {
        self.kind
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

/// 配置源连接描述
///
/// 每次解析配置源地址时创建一次，创建后不可变。
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    /// 地址协议，注册表据此选择提供者
    pub scheme: String,
    /// 远程服务地址 `host[:port]`
    pub endpoint: String,
    /// 应用标识
    pub application_id: String,
    /// 集群名称
    pub cluster: String,
    /// 命名空间
    pub namespace: String,
    /// 命名空间内的配置键
    pub config_key: String,
    /// 访问密钥
    pub access_secret: Option<SecretString>,
    /// 内容格式
    pub content_format: ContentFormat,
    /// 本地缓存目录，由远程客户端用于离线回退
    pub cache_directory: Option<PathBuf>,
}

impl ConnectionDescriptor {
    /// 是否携带访问密钥
    pub fn has_secret(&self) -> bool {
        self.access_secret.is_some()
    }
}
