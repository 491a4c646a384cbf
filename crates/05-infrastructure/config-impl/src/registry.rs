//! 配置源注册表实现

use crate::provider::REMOTE_CONFIG_PROVIDER_NAME;
use config_abstractions::{ConfigSourceProvider, ContentFormat, ProviderFactory, ProviderRegistry};
use dashmap::DashMap;
use infrastructure_common::{ConfigError, ConfigResult};
use tracing::{debug, info};
use url::Url;

/// 已打开的配置源
pub struct OpenedSource {
    /// 提供者名称
    pub provider_name: String,
    /// 已解析的提供者实例
    pub provider: Box<dyn ConfigSourceProvider>,
    /// 内容格式
    pub format: ContentFormat,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("provider_name", &self.provider_name)
            .field("format", &self.format)
            .finish()
    }
}

/// 配置源注册表
///
/// 按名称保存提供者工厂，每次打开配置源都创建新的提供者实例。
pub struct ConfigSourceRegistry {
    factories: DashMap<String, ProviderFactory>,
    default_provider: String,
}

impl std::fmt::Debug for ConfigSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSourceRegistry")
            .field("providers", &self.names())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

impl ConfigSourceRegistry {
    /// 创建新的注册表，默认提供者为远程配置源
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
            default_provider: REMOTE_CONFIG_PROVIDER_NAME.to_string(),
        }
    }

    /// 设置地址协议没有匹配提供者时使用的默认提供者
    pub fn with_default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = name.into();
        self
    }

    /// 打开配置源
    ///
    /// 按地址协议选择提供者，协议未注册时使用默认提供者。
    pub async fn open(&self, source_uri: &str, watch: bool) -> ConfigResult<OpenedSource> {
        let url = Url::parse(source_uri)
            .map_err(|e| ConfigError::invalid_uri(source_uri, e.to_string()))?;

        let provider_name = if self.contains(url.scheme()) {
            url.scheme().to_string()
        } else {
            debug!(
                "协议 {} 没有对应的提供者，使用默认提供者 {}",
                url.scheme(),
                self.default_provider
            );
            self.default_provider.clone()
        };

        let mut provider = self.create(&provider_name)?;
        let format = provider.parse(source_uri, watch).await?;

        info!("打开配置源: provider={}, format={}", provider_name, format);
        Ok(OpenedSource {
            provider_name,
            provider,
            format,
        })
    }
}

impl Default for ConfigSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry for ConfigSourceRegistry {
    fn register(&self, name: &str, factory: ProviderFactory) -> ConfigResult<()> {
        match self.factories.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ConfigError::ProviderAlreadyRegistered {
                name: name.to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(factory);
                info!("注册配置源提供者: {}", name);
                Ok(())
            }
        }
    }

    fn create(&self, name: &str) -> ConfigResult<Box<dyn ConfigSourceProvider>> {
        // 先克隆工厂再调用，避免持有分片锁时执行用户代码
        let factory = self
            .factories
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ConfigError::ProviderNotFound {
                name: name.to_string(),
            })?;
        Ok(factory())
    }

    fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}
