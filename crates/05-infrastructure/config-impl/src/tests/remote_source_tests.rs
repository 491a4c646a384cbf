//! 远程配置源端到端测试

use super::super::*;
use config_abstractions::{ConfigSourceProvider, ProviderRegistry};
use infrastructure_common::{ConfigError, WatchState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ORDERS_URI: &str =
    "svc://cfg.internal:8080?configKey=app.json&configType=json&namespaceName=default&appId=orders";

fn orders_client() -> MemoryRemoteClient {
    MemoryRemoteClient::new()
        .with_endpoints(["cfg.internal:8080"])
        .with_value("default", "app.json", r#"{"port":8080}"#)
}

/// 测试完整流程：解析、读取、单次变更、再次读取
#[tokio::test]
async fn test_watch_read_and_change_roundtrip() {
    let client = orders_client();
    let mut provider = RemoteConfigProvider::new(Arc::new(client.clone()));

    let format = provider.parse(ORDERS_URI, true).await.unwrap();
    assert_eq!(format.as_str(), "json");
    assert_eq!(provider.read_config().unwrap(), br#"{"port":8080}"#.to_vec());

    let changes = provider.is_config_changed();
    client.publish("default", "app.json", r#"{"port":9090}"#);

    let fired = tokio::time::timeout(Duration::from_secs(1), changes.changed())
        .await
        .expect("变更信号应该到达");
    assert!(fired);
    assert!(!changes.try_changed(), "一次变更只应产生一个信号");
    assert_eq!(provider.read_config().unwrap(), br#"{"port":9090}"#.to_vec());

    provider.close().await.unwrap();
}

/// 测试多次快速变更合并为一个待处理信号
#[tokio::test]
async fn test_rapid_changes_coalesce() {
    let client = orders_client();
    let mut provider = RemoteConfigProvider::new(Arc::new(client.clone()));
    provider.parse(ORDERS_URI, true).await.unwrap();

    for version in 0..25 {
        client.publish("default", "app.json", format!(r#"{{"v":{}}}"#, version));
    }

    let changes = provider.is_config_changed();
    assert!(changes.try_changed());
    assert!(!changes.try_changed());
    assert_eq!(provider.bridge_stats().delivered, 1);
    assert_eq!(provider.bridge_stats().coalesced, 24);
    assert_eq!(provider.read_config().unwrap(), br#"{"v":24}"#.to_vec());
}

/// 测试缺少键时读取返回空内容而不是错误
#[tokio::test]
async fn test_missing_key_reads_empty() {
    let client = MemoryRemoteClient::new();
    let mut provider = RemoteConfigProvider::new(Arc::new(client));
    provider
        .parse("svc://cfg?configKey=absent&configType=properties&appId=a", false)
        .await
        .unwrap();

    assert_eq!(provider.read_config().unwrap(), Vec::<u8>::new());
}

/// 测试必需参数缺失时不会尝试建立远程会话
#[tokio::test]
async fn test_missing_required_params_fail_before_start() {
    let client = orders_client();
    for uri in [
        "svc://cfg.internal:8080?configType=json&appId=orders",
        "svc://cfg.internal:8080?configKey=app.json&appId=orders",
        "svc://cfg.internal:8080?configKey=&configType=&appId=orders",
    ] {
        let mut provider = RemoteConfigProvider::new(Arc::new(client.clone()));
        let err = provider.parse(uri, true).await.unwrap_err();
        assert!(err.is_fatal(), "{} 应为致命错误", uri);
    }
    assert_eq!(client.start_count(), 0);
}

/// 测试远程会话启动失败为致命错误
#[tokio::test]
async fn test_unreachable_endpoint_is_fatal() {
    let client = orders_client();
    let mut provider = RemoteConfigProvider::new(Arc::new(client.clone()));

    let err = provider
        .parse("svc://elsewhere:8080?configKey=app.json&configType=json&appId=orders", true)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::SessionStartFailed { .. }));
    assert!(err.is_fatal());
    assert_eq!(provider.watch_state(), WatchState::Disabled);
}

/// 测试关闭与并发回调竞争时不 panic，关闭后不再投递信号
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_races_with_publishers() {
    let client = orders_client();
    let mut provider = RemoteConfigProvider::new(Arc::new(client.clone()));
    provider.parse(ORDERS_URI, true).await.unwrap();
    let changes = provider.is_config_changed();

    let running = Arc::new(AtomicBool::new(true));
    let publishers: Vec<_> = (0..4)
        .map(|worker| {
            let client = client.clone();
            let running = running.clone();
            std::thread::spawn(move || {
                let mut version = 0u64;
                while running.load(Ordering::Relaxed) {
                    client.publish("default", "app.json", format!("{}-{}", worker, version));
                    version += 1;
                }
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    provider.close().await.unwrap();
    let stats_at_close = provider.bridge_stats();

    tokio::time::sleep(Duration::from_millis(20)).await;
    running.store(false, Ordering::Relaxed);
    for publisher in publishers {
        publisher.join().expect("发布线程不应 panic");
    }

    let stats = provider.bridge_stats();
    assert_eq!(stats.delivered, stats_at_close.delivered);
    assert_eq!(stats.coalesced, stats_at_close.coalesced);
    assert_eq!(provider.watch_state(), WatchState::Closed);
    assert!(!changes.try_changed());
    assert!(!changes.changed().await);
    assert_eq!(client.listener_count(), 0);
}

/// 测试注册表按名称打开配置源
#[tokio::test]
async fn test_registry_opens_registered_provider() {
    let registry = ConfigSourceRegistry::new();
    register_remote_provider(&registry, Arc::new(orders_client())).unwrap();
    assert!(registry.contains(REMOTE_CONFIG_PROVIDER_NAME));

    let mut opened = registry.open(ORDERS_URI, true).await.unwrap();
    assert_eq!(opened.format.as_str(), "json");
    assert_eq!(opened.provider.read_config().unwrap(), br#"{"port":8080}"#.to_vec());

    opened.provider.close().await.unwrap();
}

/// 测试轮询客户端驱动的变更通知
#[tokio::test]
async fn test_polling_backend_drives_change_signal() {
    use async_trait::async_trait;
    use config_abstractions::ConnectionDescriptor;
    use parking_lot::Mutex;

    struct SharedSnapshot(Arc<Mutex<NamespaceSnapshot>>);

    #[async_trait]
    impl SnapshotSource for SharedSnapshot {
        async fn fetch(&self, _descriptor: &ConnectionDescriptor) -> Result<NamespaceSnapshot, ConfigError> {
            Ok(self.0.lock().clone())
        }
    }

    let remote = Arc::new(Mutex::new(NamespaceSnapshot::from([(
        "app.json".to_string(),
        "v1".to_string(),
    )])));
    let client = PollingRemoteClient::new(SharedSnapshot(remote.clone()))
        .with_interval(Duration::from_millis(10));
    let mut provider = RemoteConfigProvider::new(Arc::new(client));
    provider.parse(ORDERS_URI, true).await.unwrap();
    assert_eq!(provider.read_config().unwrap(), b"v1".to_vec());

    remote.lock().insert("app.json".to_string(), "v2".to_string());
    let fired = tokio::time::timeout(Duration::from_secs(2), provider.is_config_changed().changed())
        .await
        .expect("轮询应检测到变更");
    assert!(fired);
    assert_eq!(provider.read_config().unwrap(), b"v2".to_vec());

    provider.close().await.unwrap();
}
