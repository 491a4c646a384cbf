//! 远程配置源提供者

use crate::adapter::RemoteClientAdapter;
use crate::bridge::{BridgeStats, ChangeBridge};
use crate::parser::parse_source_uri;
use async_trait::async_trait;
use config_abstractions::{
    ChangeReceiver, ConfigSourceProvider, ConnectionDescriptor, ContentFormat, ProviderRegistry,
    RemoteConfigClient,
};
use infrastructure_common::{ConfigError, ConfigResult, WatchState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 远程配置源提供者的注册名称
pub const REMOTE_CONFIG_PROVIDER_NAME: &str = "remote-config";

struct ParsedSource {
    descriptor: ConnectionDescriptor,
    adapter: RemoteClientAdapter,
}

/// 远程配置源提供者
///
/// 组合地址解析、远程客户端适配器和变更通知桥，实现 [`ConfigSourceProvider`]。
pub struct RemoteConfigProvider {
    client: Arc<dyn RemoteConfigClient>,
    source: Option<ParsedSource>,
    bridge: ChangeBridge,
}

impl std::fmt::Debug for RemoteConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigProvider")
            .field("client", &self.client.name())
            .field("descriptor", &self.source.as_ref().map(|s| &s.descriptor))
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl RemoteConfigProvider {
    /// 创建新的远程配置源提供者
    pub fn new(client: Arc<dyn RemoteConfigClient>) -> Self {
        Self {
            client,
            source: None,
            bridge: ChangeBridge::new(),
        }
    }

    /// 获取解析后的连接描述
    pub fn descriptor(&self) -> Option<&ConnectionDescriptor> {
        self.source.as_ref().map(|source| &source.descriptor)
    }

    /// 获取监听状态
    pub fn watch_state(&self) -> WatchState {
        self.bridge.state()
    }

    /// 获取通知桥统计信息
    pub fn bridge_stats(&self) -> BridgeStats {
        self.bridge.stats()
    }
}

#[async_trait]
impl ConfigSourceProvider for RemoteConfigProvider {
    async fn parse(&mut self, source_uri: &str, watch: bool) -> ConfigResult<ContentFormat> {
        if self.bridge.state().is_closed() {
            return Err(ConfigError::AlreadyClosed);
        }
        if self.source.is_some() {
            return Err(ConfigError::AlreadyParsed {
                uri: source_uri.to_string(),
            });
        }

        // 必需参数缺失时在建立任何远程会话之前失败
        let descriptor = parse_source_uri(source_uri)?;
        let mut adapter = RemoteClientAdapter::start(self.client.as_ref(), &descriptor).await?;

        if watch {
            if let Err(e) = self.bridge.enable(&adapter) {
                // 已建立的会话不能随适配器一起泄漏
                warn!("启用变更监听失败，释放远程会话: {}", e);
                if let Err(stop_err) = adapter.stop().await {
                    warn!("释放远程会话失败: {}", stop_err);
                }
                return Err(e);
            }
        }

        info!(
            "远程配置源就绪: endpoint={}, namespace={}, key={}, format={}, watch={}",
            descriptor.endpoint,
            descriptor.namespace,
            descriptor.config_key,
            descriptor.content_format,
            watch
        );

        let format = descriptor.content_format.clone();
        self.source = Some(ParsedSource {
            descriptor,
            adapter,
        });
        Ok(format)
    }

    fn read_config(&self) -> ConfigResult<Vec<u8>> {
        let source = self.source.as_ref().ok_or(ConfigError::NotParsed)?;
        let value = source.adapter.read(&source.descriptor.config_key);
        debug!(
            "读取远程配置: key={}, {} 字节",
            source.descriptor.config_key,
            value.len()
        );
        Ok(value.into_bytes())
    }

    async fn close(&mut self) -> ConfigResult<()> {
        // 先停止接收信号，再释放会话；会话释放过程中可能还会触发最后一次回调
        self.bridge.close();

        if let Some(source) = self.source.as_mut() {
            source.adapter.stop().await?;
        }
        Ok(())
    }

    fn is_config_changed(&self) -> ChangeReceiver {
        self.bridge.receiver()
    }

    fn name(&self) -> &str {
        REMOTE_CONFIG_PROVIDER_NAME
    }
}

/// 在注册表中注册远程配置源提供者
///
/// 由宿主的启动流程显式调用一次。
pub fn register_remote_provider(
    registry: &dyn ProviderRegistry,
    client: Arc<dyn RemoteConfigClient>,
) -> ConfigResult<()> {
    info!(
        "注册远程配置源提供者: {} ({})",
        REMOTE_CONFIG_PROVIDER_NAME,
        client.name()
    );
    registry.register(
        REMOTE_CONFIG_PROVIDER_NAME,
        Arc::new(move || {
            Box::new(RemoteConfigProvider::new(Arc::clone(&client))) as Box<dyn ConfigSourceProvider>
        }),
    )
}
