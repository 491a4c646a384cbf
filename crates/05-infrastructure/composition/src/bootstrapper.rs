//! 远程配置源启动器

use crate::reload::{spawn_reload_loop, ReloadLoop, SharedProvider};
use crate::settings::BootstrapSettings;
use config_abstractions::{ChangeReceiver, ContentFormat, ProviderRegistry, RemoteConfigClient};
use config_impl::{register_remote_provider, ConfigSourceRegistry, OpenedSource};
use infrastructure_common::{InfrastructureError, InfrastructureResult, WatchState};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 远程配置源启动器
///
/// 负责注册提供者、打开配置源，并把结果交给宿主。
#[derive(Debug)]
pub struct RemoteConfigBootstrapper {
    registry: Arc<ConfigSourceRegistry>,
    settings: BootstrapSettings,
}

impl RemoteConfigBootstrapper {
    /// 创建新的启动器
    pub fn new(settings: BootstrapSettings) -> Self {
        let registry = ConfigSourceRegistry::new().with_default_provider(settings.provider.clone());
        Self {
            registry: Arc::new(registry),
            settings,
        }
    }

    /// 使用已有的注册表
    pub fn with_registry(mut self, registry: Arc<ConfigSourceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// 注册远程配置客户端
    pub fn register_client(
        self,
        client: Arc<dyn RemoteConfigClient>,
    ) -> InfrastructureResult<Self> {
        register_remote_provider(self.registry.as_ref(), client)?;
        Ok(self)
    }

    /// 获取注册表
    pub fn registry(&self) -> &Arc<ConfigSourceRegistry> {
        &self.registry
    }

    /// 获取启动配置
    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// 打开配置源
    ///
    /// 返回的错误都是启动期错误，宿主通常交给 [`crate::exit_on_fatal`] 处理。
    pub async fn bootstrap(self) -> InfrastructureResult<ConfigSourceHandle> {
        info!("开始启动远程配置源");
        debug!("已注册的提供者: {:?}", self.registry.names());

        let opened = self
            .registry
            .open(&self.settings.source_uri, self.settings.watch)
            .await
            .map_err(|e| {
                error!("打开配置源失败: {}", e);
                InfrastructureError::from(e)
            })?;

        let OpenedSource {
            provider_name,
            provider,
            format,
        } = opened;
        let changes = provider.is_config_changed();

        info!(
            "远程配置源启动完成: provider={}, format={}, watch={}",
            provider_name, format, self.settings.watch
        );
        Ok(ConfigSourceHandle {
            provider_name,
            format,
            provider: Arc::new(RwLock::new(provider)),
            changes,
            reload: None,
        })
    }
}

/// 已启动的配置源句柄
pub struct ConfigSourceHandle {
    provider_name: String,
    format: ContentFormat,
    provider: SharedProvider,
    changes: ChangeReceiver,
    reload: Option<ReloadLoop>,
}

impl std::fmt::Debug for ConfigSourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSourceHandle")
            .field("provider_name", &self.provider_name)
            .field("format", &self.format)
            .field("changes", &self.changes)
            .field("reload", &self.reload.is_some())
            .finish()
    }
}

impl ConfigSourceHandle {
    /// 内容格式
    pub fn format(&self) -> &ContentFormat {
        &self.format
    }

    /// 提供者名称
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// 监听状态
    pub fn watch_state(&self) -> WatchState {
        self.changes.state()
    }

    /// 读取当前配置内容
    pub async fn read_config(&self) -> InfrastructureResult<Vec<u8>> {
        Ok(self.provider.read().await.read_config()?)
    }

    /// 获取变更接收器
    pub fn changes(&self) -> ChangeReceiver {
        self.changes.clone()
    }

    /// 启动重载循环，已有循环在运行时返回 `false`
    pub fn start_reload_loop<F>(&mut self, on_change: F) -> bool
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        if self.reload.is_some() {
            warn!("重载循环已在运行");
            return false;
        }
        self.reload = Some(spawn_reload_loop(
            Arc::clone(&self.provider),
            self.changes.clone(),
            on_change,
        ));
        true
    }

    /// 关闭配置源并停止重载循环
    ///
    /// 返回重载循环累计的重载次数。
    pub async fn shutdown(mut self) -> InfrastructureResult<u64> {
        info!("关闭远程配置源: {}", self.provider_name);

        let closed = self.provider.write().await.close().await;

        let reloads = match self.reload.take() {
            Some(reload) => reload.stop().await,
            None => 0,
        };

        closed.map_err(|e| InfrastructureError::ShutdownFailed {
            message: e.to_string(),
        })?;
        info!("远程配置源已关闭");
        Ok(reloads)
    }
}
