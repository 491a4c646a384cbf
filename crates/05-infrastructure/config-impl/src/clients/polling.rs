//! 轮询远程配置客户端
//!
//! 启动时同步拉取一次完整快照，之后由后台任务按固定间隔重新拉取并与本地缓存比对，
//! 发现差异时更新缓存并调用更新回调。停止会话时取消并等待后台任务退出。

use async_trait::async_trait;
use config_abstractions::{
    ConnectionDescriptor, KeyChange, KeyChangeType, NamespaceChangeEvent, RemoteConfigClient,
    RemoteSession, UpdateCallback,
};
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 命名空间快照
pub type NamespaceSnapshot = HashMap<String, String>;

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 快照数据源 trait
///
/// 拉取描述所指命名空间的完整键值快照，具体协议由实现方决定。
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// 拉取完整快照
    async fn fetch(&self, descriptor: &ConnectionDescriptor) -> Result<NamespaceSnapshot, ConfigError>;
}

/// 轮询远程配置客户端
pub struct PollingRemoteClient<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S> std::fmt::Debug for PollingRemoteClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingRemoteClient")
            .field("interval", &self.interval)
            .finish()
    }
}

impl<S: SnapshotSource> PollingRemoteClient<S> {
    /// 创建新的轮询客户端
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// 设置轮询间隔
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl<S: SnapshotSource> RemoteConfigClient for PollingRemoteClient<S> {
    async fn start(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn RemoteSession>, ConfigError> {
        let snapshot = self
            .source
            .fetch(descriptor)
            .await
            .map_err(|e| ConfigError::session_start_failed(&descriptor.endpoint, e.to_string()))?;
        debug!("初始快照拉取完成: {} 个配置键", snapshot.len());

        let cache = Arc::new(RwLock::new(snapshot));
        let callback: Arc<RwLock<Option<UpdateCallback>>> = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            descriptor.clone(),
            self.interval,
            Arc::clone(&cache),
            Arc::clone(&callback),
            cancel.clone(),
        ));

        info!(
            "轮询配置会话已建立: namespace={}, interval={:?}",
            descriptor.namespace, self.interval
        );
        Ok(Box::new(PollingSession {
            namespace: descriptor.namespace.clone(),
            cache,
            callback,
            cancel,
            task: Some(task),
        }))
    }

    fn name(&self) -> &str {
        "PollingRemoteClient"
    }
}

async fn poll_loop<S: SnapshotSource>(
    source: Arc<S>,
    descriptor: ConnectionDescriptor,
    interval: Duration,
    cache: Arc<RwLock<NamespaceSnapshot>>,
    callback: Arc<RwLock<Option<UpdateCallback>>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // 第一次 tick 立即完成，初始快照已在启动时拉取
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = source.fetch(&descriptor) => fetched,
        };

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // 下一次 tick 自然重试
                warn!("轮询拉取配置快照失败: {}", e);
                continue;
            }
        };

        let changes = diff_snapshots(&cache.read(), &snapshot);
        if changes.is_empty() {
            continue;
        }

        *cache.write() = snapshot;
        debug!("检测到 {} 个配置键变更: {}", changes.len(), descriptor.namespace);

        let current = callback.read().clone();
        if let Some(current) = current {
            current(&NamespaceChangeEvent::new(descriptor.namespace.clone(), changes));
        }
    }

    debug!("轮询任务退出: {}", descriptor.namespace);
}

/// 比对两个快照，结果按键排序
pub fn diff_snapshots(old: &NamespaceSnapshot, new: &NamespaceSnapshot) -> Vec<KeyChange> {
    let mut changes: Vec<KeyChange> = new
        .iter()
        .filter_map(|(key, value)| match old.get(key) {
            None => Some(KeyChange::new(key.clone(), KeyChangeType::Added)),
            Some(previous) if previous != value => {
                Some(KeyChange::new(key.clone(), KeyChangeType::Modified))
            }
            Some(_) => None,
        })
        .chain(
            old.keys()
                .filter(|key| !new.contains_key(*key))
                .map(|key| KeyChange::new(key.clone(), KeyChangeType::Deleted)),
        )
        .collect();
    changes.sort_by(|a, b| a.key.cmp(&b.key));
    changes
}

/// 轮询配置会话
struct PollingSession {
    namespace: String,
    cache: Arc<RwLock<NamespaceSnapshot>>,
    callback: Arc<RwLock<Option<UpdateCallback>>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl RemoteSession for PollingSession {
    fn get_value(&self, namespace: &str, key: &str) -> Option<String> {
        if namespace != self.namespace {
            return None;
        }
        self.cache.read().get(key).cloned()
    }

    fn on_update(&self, callback: UpdateCallback) {
        *self.callback.write() = Some(callback);
    }

    async fn stop(&mut self) -> Result<(), ConfigError> {
        self.cancel.cancel();
        *self.callback.write() = None;

        if let Some(task) = self.task.take() {
            task.await.map_err(|e| ConfigError::SessionStopFailed {
                message: format!("轮询任务异常退出: {}", e),
            })?;
            info!("轮询配置会话已释放: {}", self.namespace);
        }
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        // 未显式停止时也要结束后台任务
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source_uri;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 按顺序返回预设结果，用完后重复最后一个快照
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<NamespaceSnapshot, String>>>,
        last: Mutex<NamespaceSnapshot>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<NamespaceSnapshot, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(NamespaceSnapshot::new()),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self, _descriptor: &ConnectionDescriptor) -> Result<NamespaceSnapshot, ConfigError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().pop_front() {
                Some(Ok(snapshot)) => {
                    *self.last.lock() = snapshot.clone();
                    Ok(snapshot)
                }
                Some(Err(message)) => Err(ConfigError::FetchFailed { message }),
                None => Ok(self.last.lock().clone()),
            }
        }
    }

    fn snapshot(pairs: &[(&str, &str)]) -> NamespaceSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn descriptor() -> ConnectionDescriptor {
        parse_source_uri("poll://cfg?configKey=app&configType=json&appId=a&namespaceName=ns").unwrap()
    }

    #[test]
    fn diff_reports_all_change_kinds() {
        let old = snapshot(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let new = snapshot(&[("a", "1"), ("b", "20"), ("d", "4")]);

        let changes = diff_snapshots(&old, &new);
        assert_eq!(
            changes,
            vec![
                KeyChange::new("b", KeyChangeType::Modified),
                KeyChange::new("c", KeyChangeType::Deleted),
                KeyChange::new("d", KeyChangeType::Added),
            ]
        );
        assert!(diff_snapshots(&new, &new).is_empty());
    }

    #[tokio::test]
    async fn failed_initial_fetch_fails_start() {
        let client = PollingRemoteClient::new(ScriptedSource::new(vec![Err("down".to_string())]));

        let err = client.start(&descriptor()).await.err().unwrap();
        assert!(matches!(err, ConfigError::SessionStartFailed { .. }));
    }

    #[tokio::test]
    async fn detects_changes_and_survives_fetch_errors() {
        let source = ScriptedSource::new(vec![
            Ok(snapshot(&[("app", "v1")])),
            Err("transient".to_string()),
            Ok(snapshot(&[("app", "v2")])),
        ]);
        let client = PollingRemoteClient::new(source).with_interval(Duration::from_millis(10));
        let mut session = client.start(&descriptor()).await.unwrap();
        assert_eq!(session.get_value("ns", "app").as_deref(), Some("v1"));
        assert_eq!(session.get_value("other", "app"), None);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        session.on_update(Arc::new(move |event: &NamespaceChangeEvent| {
            let _ = tx.send(event.changes.clone());
        }));

        let changes = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("应在超时前检测到变更")
            .unwrap();
        assert_eq!(changes, vec![KeyChange::new("app", KeyChangeType::Modified)]);
        assert_eq!(session.get_value("ns", "app").as_deref(), Some("v2"));

        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_ends_background_task() {
        let client = PollingRemoteClient::new(ScriptedSource::new(vec![Ok(snapshot(&[("app", "v1")]))]))
            .with_interval(Duration::from_millis(5));
        let mut session = client.start(&descriptor()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        session.stop().await.unwrap();
        let fetches = client.source.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(client.source.fetches.load(Ordering::SeqCst), fetches);
        session.stop().await.unwrap();
    }
}
