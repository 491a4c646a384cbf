//! 远程配置客户端抽象接口

use crate::descriptor::ConnectionDescriptor;
use crate::events::NamespaceChangeEvent;
use async_trait::async_trait;
use infrastructure_common::ConfigError;
use std::sync::Arc;

/// 更新回调
///
/// 远程客户端可能在任意线程、并发地、甚至在会话停止后调用它。
pub type UpdateCallback = Arc<dyn Fn(&NamespaceChangeEvent) + Send + Sync>;

/// 远程配置客户端 trait
///
/// 负责建立与远程配置服务的会话。
#[async_trait]
pub trait RemoteConfigClient: Send + Sync {
    /// 建立会话：握手、认证、拉取初始命名空间快照
    ///
    /// 这是整个适配器中唯一允许阻塞在网络上的调用。
    async fn start(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn RemoteSession>, ConfigError>;

    /// 获取客户端名称
    fn name(&self) -> &str;
}

/// 远程配置会话 trait
///
/// 绑定单个命名空间，由远程客户端适配器独占持有。
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// 读取本地缓存中的配置值，不触发网络 I/O
    fn get_value(&self, namespace: &str, key: &str) -> Option<String>;

    /// 注册更新回调，后注册的回调替换先前的回调
    fn on_update(&self, callback: UpdateCallback);

    /// 释放会话
    async fn stop(&mut self) -> Result<(), ConfigError>;

    /// 获取会话绑定的命名空间
    fn namespace(&self) -> &str;
}
