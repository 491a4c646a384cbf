//! 远程配置客户端适配器

use config_abstractions::{ConnectionDescriptor, RemoteConfigClient, RemoteSession, UpdateCallback};
use infrastructure_common::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

/// 远程配置客户端适配器
///
/// 独占持有远程会话，对外提供统一的启动、读取、回调注册和停止操作。
/// 停止后会话被释放，后续读取返回空字符串，回调注册返回错误。
pub struct RemoteClientAdapter {
    /// 远程会话，停止后为空
    session: Option<Box<dyn RemoteSession>>,
    /// 绑定的命名空间
    namespace: String,
    /// 远程服务地址
    endpoint: String,
    /// 是否已注册更新回调
    callback_registered: AtomicBool,
}

impl std::fmt::Debug for RemoteClientAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClientAdapter")
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .field("stopped", &self.is_stopped())
            .field(
                "callback_registered",
                &self.callback_registered.load(Ordering::Acquire),
            )
            .finish()
    }
}

impl RemoteClientAdapter {
    /// 启动远程会话
    ///
    /// 会阻塞在握手和初始快照拉取上。任何失败都归类为会话启动失败。
    #[instrument(
        name = "remote_config",
        skip_all,
        fields(
            client = client.name(),
            endpoint = %descriptor.endpoint,
            namespace = %descriptor.namespace
        )
    )]
    pub async fn start(
        client: &dyn RemoteConfigClient,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Self, ConfigError> {
        info!(
            "启动远程配置会话: app_id={}, cluster={}, 认证={}",
            descriptor.application_id,
            descriptor.cluster,
            descriptor.has_secret()
        );

        let session = client.start(descriptor).await.map_err(|e| match e {
            e @ ConfigError::SessionStartFailed { .. } => e,
            other => ConfigError::session_start_failed(&descriptor.endpoint, other.to_string()),
        })?;

        info!("远程配置会话启动完成");
        Ok(Self {
            session: Some(session),
            namespace: descriptor.namespace.clone(),
            endpoint: descriptor.endpoint.clone(),
            callback_registered: AtomicBool::new(false),
        })
    }

    /// 读取配置值
    ///
    /// 只读本地缓存。键不存在或会话已停止时返回空字符串。
    pub fn read(&self, key: &str) -> String {
        let Some(session) = self.session.as_ref() else {
            warn!("远程配置会话已停止，读取返回空值: {}", key);
            return String::new();
        };

        match session.get_value(&self.namespace, key) {
            Some(value) => value,
            None => {
                debug!("命名空间 {} 中不存在配置键: {}", self.namespace, key);
                String::new()
            }
        }
    }

    /// 注册更新回调，每个会话最多注册一次
    pub fn register_update_callback(&self, callback: UpdateCallback) -> Result<(), ConfigError> {
        let Some(session) = self.session.as_ref() else {
            return Err(ConfigError::AlreadyClosed);
        };

        if self
            .callback_registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ConfigError::CallbackAlreadyRegistered);
        }

        session.on_update(callback);
        debug!("注册更新回调: namespace={}", self.namespace);
        Ok(())
    }

    /// 停止远程会话，重复调用不做任何事
    pub async fn stop(&mut self) -> Result<(), ConfigError> {
        let Some(mut session) = self.session.take() else {
            debug!("远程配置会话已停止");
            return Ok(());
        };

        info!("停止远程配置会话: {}", self.endpoint);
        session.stop().await
    }

    /// 会话是否已停止
    pub fn is_stopped(&self) -> bool {
        self.session.is_none()
    }

    /// 获取绑定的命名空间
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
