//! 内存远程配置客户端
//!
//! 基于监听器的变更通知：`publish` 修改命名空间后同步调用所有监听该命名空间的回调。

use async_trait::async_trait;
use config_abstractions::{
    ConnectionDescriptor, KeyChange, KeyChangeType, NamespaceChangeEvent, RemoteConfigClient,
    RemoteSession, UpdateCallback,
};
use infrastructure_common::ConfigError;
use parking_lot::{Mutex, RwLock};
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Listener {
    namespace: String,
    callback: UpdateCallback,
}

#[derive(Default)]
struct MemoryStore {
    namespaces: RwLock<HashMap<String, HashMap<String, String>>>,
    listeners: RwLock<HashMap<Uuid, Listener>>,
    endpoints: RwLock<Option<HashSet<String>>>,
    secret: RwLock<Option<SecretString>>,
    next_start_failure: Mutex<Option<String>>,
    start_count: AtomicUsize,
    active_sessions: AtomicUsize,
}

/// 内存远程配置客户端
///
/// 克隆出的客户端共享同一份存储，测试和演示中可以一边持有会话一边发布变更。
#[derive(Clone, Default)]
pub struct MemoryRemoteClient {
    store: Arc<MemoryStore>,
}

impl std::fmt::Debug for MemoryRemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRemoteClient")
            .field("namespaces", &self.store.namespaces.read().len())
            .field("listeners", &self.listener_count())
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

impl MemoryRemoteClient {
    /// 创建新的内存客户端
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置配置值
    pub fn with_value(
        self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.store
            .namespaces
            .write()
            .entry(namespace.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// 只接受指定地址的会话
    pub fn with_endpoints<I, S>(self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.store.endpoints.write() = Some(endpoints.into_iter().map(Into::into).collect());
        self
    }

    /// 要求会话携带匹配的访问密钥
    pub fn with_secret(self, secret: impl Into<String>) -> Self {
        *self.store.secret.write() = Some(SecretString::new(secret.into()));
        self
    }

    /// 让下一次启动失败
    pub fn fail_next_start(&self, message: impl Into<String>) {
        *self.store.next_start_failure.lock() = Some(message.into());
    }

    /// 发布配置值并通知监听者
    pub fn publish(&self, namespace: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        let change_type = {
            let mut namespaces = self.store.namespaces.write();
            let entries = namespaces.entry(namespace.to_string()).or_default();
            match entries.insert(key.to_string(), value.clone()) {
                None => Some(KeyChangeType::Added),
                Some(previous) if previous != value => Some(KeyChangeType::Modified),
                Some(_) => None,
            }
        };

        match change_type {
            Some(change_type) => self.fire(namespace, vec![KeyChange::new(key, change_type)]),
            None => debug!("配置值未变化，不通知: {}/{}", namespace, key),
        }
    }

    /// 删除配置值并通知监听者
    pub fn remove(&self, namespace: &str, key: &str) {
        let removed = self
            .store
            .namespaces
            .write()
            .get_mut(namespace)
            .and_then(|entries| entries.remove(key))
            .is_some();

        if removed {
            self.fire(namespace, vec![KeyChange::new(key, KeyChangeType::Deleted)]);
        }
    }

    /// 当前注册的监听者数量
    pub fn listener_count(&self) -> usize {
        self.store.listeners.read().len()
    }

    /// 累计启动次数，包括失败的启动
    pub fn start_count(&self) -> usize {
        self.store.start_count.load(Ordering::SeqCst)
    }

    /// 活跃会话数
    pub fn active_sessions(&self) -> usize {
        self.store.active_sessions.load(Ordering::SeqCst)
    }

    fn fire(&self, namespace: &str, changes: Vec<KeyChange>) {
        // 先复制回调再调用，回调内可以安全地再次访问客户端
        let callbacks: Vec<UpdateCallback> = self
            .store
            .listeners
            .read()
            .values()
            .filter(|listener| listener.namespace == namespace)
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        let event = NamespaceChangeEvent::new(namespace, changes);
        debug!(
            "命名空间 {} 变更，通知 {} 个监听者",
            namespace,
            callbacks.len()
        );
        for callback in callbacks {
            callback(&event);
        }
    }

    fn authorize(&self, descriptor: &ConnectionDescriptor) -> Result<(), String> {
        if let Some(message) = self.store.next_start_failure.lock().take() {
            return Err(message);
        }

        if let Some(endpoints) = self.store.endpoints.read().as_ref() {
            if !endpoints.contains(&descriptor.endpoint) {
                return Err(format!("未知的配置服务地址: {}", descriptor.endpoint));
            }
        }

        if let Some(expected) = self.store.secret.read().as_ref() {
            let provided = descriptor
                .access_secret
                .as_ref()
                .map(|secret| secret.expose_secret().as_str());
            if provided != Some(expected.expose_secret().as_str()) {
                return Err("访问密钥校验失败".to_string());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteConfigClient for MemoryRemoteClient {
    async fn start(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn RemoteSession>, ConfigError> {
        self.store.start_count.fetch_add(1, Ordering::SeqCst);

        if let Err(message) = self.authorize(descriptor) {
            warn!("内存配置会话启动失败: {}", message);
            return Err(ConfigError::session_start_failed(&descriptor.endpoint, message));
        }

        let session = MemorySession {
            id: Uuid::new_v4(),
            namespace: descriptor.namespace.clone(),
            store: Arc::clone(&self.store),
            stopped: false,
        };
        self.store.active_sessions.fetch_add(1, Ordering::SeqCst);
        info!("内存配置会话已建立: {}", session.id);
        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "MemoryRemoteClient"
    }
}

/// 内存配置会话
struct MemorySession {
    id: Uuid,
    namespace: String,
    store: Arc<MemoryStore>,
    stopped: bool,
}

#[async_trait]
impl RemoteSession for MemorySession {
    fn get_value(&self, namespace: &str, key: &str) -> Option<String> {
        self.store
            .namespaces
            .read()
            .get(namespace)
            .and_then(|entries| entries.get(key).cloned())
    }

    fn on_update(&self, callback: UpdateCallback) {
        if self.stopped {
            return;
        }
        self.store.listeners.write().insert(
            self.id,
            Listener {
                namespace: self.namespace.clone(),
                callback,
            },
        );
    }

    async fn stop(&mut self) -> Result<(), ConfigError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.store.listeners.write().remove(&self.id);
        self.store.active_sessions.fetch_sub(1, Ordering::SeqCst);
        info!("内存配置会话已释放: {}", self.id);
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source_uri;

    fn descriptor(uri: &str) -> ConnectionDescriptor {
        parse_source_uri(uri).unwrap()
    }

    #[tokio::test]
    async fn rejects_unknown_endpoint() {
        let client = MemoryRemoteClient::new().with_endpoints(["cfg:8080"]);

        let ok = client
            .start(&descriptor("mem://cfg:8080?configKey=k&configType=json&appId=a"))
            .await;
        assert!(ok.is_ok());

        let err = client
            .start(&descriptor("mem://other:8080?configKey=k&configType=json&appId=a"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::SessionStartFailed { .. }));
        assert_eq!(client.start_count(), 2);
    }

    #[tokio::test]
    async fn checks_access_secret() {
        let client = MemoryRemoteClient::new().with_secret("token");

        assert!(client
            .start(&descriptor("mem://cfg?configKey=k&configType=json&appId=a"))
            .await
            .is_err());
        assert!(client
            .start(&descriptor("mem://cfg?configKey=k&configType=json&appId=a&secret=wrong"))
            .await
            .is_err());
        assert!(client
            .start(&descriptor("mem://cfg?configKey=k&configType=json&appId=a&secret=token"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn publish_notifies_only_matching_namespace() {
        let client = MemoryRemoteClient::new();
        let session = client
            .start(&descriptor("mem://cfg?configKey=k&configType=json&appId=a&namespaceName=ns"))
            .await
            .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.on_update(Arc::new(move |event: &NamespaceChangeEvent| {
            sink.lock().push(event.changes.clone());
        }));

        client.publish("ns", "k", "1");
        client.publish("ns", "k", "2");
        client.publish("ns", "k", "2");
        client.publish("other", "k", "x");
        client.remove("ns", "k");

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0][0].change_type, KeyChangeType::Added);
        assert_eq!(seen[1][0].change_type, KeyChangeType::Modified);
        assert_eq!(seen[2][0].change_type, KeyChangeType::Deleted);
    }

    #[tokio::test]
    async fn stop_unregisters_listener() {
        let client = MemoryRemoteClient::new();
        let mut session = client
            .start(&descriptor("mem://cfg?configKey=k&configType=json&appId=a"))
            .await
            .unwrap();
        session.on_update(Arc::new(|_: &NamespaceChangeEvent| {}));
        assert_eq!(client.listener_count(), 1);
        assert_eq!(client.active_sessions(), 1);

        session.stop().await.unwrap();
        session.stop().await.unwrap();
        assert_eq!(client.listener_count(), 0);
        assert_eq!(client.active_sessions(), 0);
    }
}
