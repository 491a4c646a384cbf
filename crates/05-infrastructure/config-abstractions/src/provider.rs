//! 配置源提供者抽象接口

use crate::descriptor::ContentFormat;
use crate::watcher::ChangeReceiver;
use async_trait::async_trait;
use infrastructure_common::ConfigResult;
use std::sync::Arc;

/// 配置源提供者 trait
///
/// 配置管理器通过它拉取配置内容，并通过 [`ChangeReceiver`] 感知变更。
#[async_trait]
pub trait ConfigSourceProvider: Send + Sync {
    /// 解析配置源地址并建立连接，返回内容格式
    async fn parse(&mut self, source_uri: &str, watch: bool) -> ConfigResult<ContentFormat>;

    /// 读取当前配置内容
    fn read_config(&self) -> ConfigResult<Vec<u8>>;

    /// 关闭配置源
    async fn close(&mut self) -> ConfigResult<()>;

    /// 获取配置变更通知的只读端
    fn is_config_changed(&self) -> ChangeReceiver;

    /// 获取提供者名称
    fn name(&self) -> &str;
}

/// 配置源提供者工厂
pub type ProviderFactory = Arc<dyn Fn() -> Box<dyn ConfigSourceProvider> + Send + Sync>;

/// 配置源注册表 trait
pub trait ProviderRegistry: Send + Sync {
    /// 注册提供者工厂，同名重复注册返回错误
    fn register(&self, name: &str, factory: ProviderFactory) -> ConfigResult<()>;

    /// 创建提供者实例
    fn create(&self, name: &str) -> ConfigResult<Box<dyn ConfigSourceProvider>>;

    /// 检查提供者是否已注册
    fn contains(&self, name: &str) -> bool;

    /// 获取所有已注册名称
    fn names(&self) -> Vec<String>;
}
