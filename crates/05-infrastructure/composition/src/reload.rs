//! 配置重载循环

use config_abstractions::{ChangeReceiver, ConfigSourceProvider};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 共享的配置源提供者
pub type SharedProvider = Arc<RwLock<Box<dyn ConfigSourceProvider>>>;

/// 正在运行的重载循环
#[derive(Debug)]
pub struct ReloadLoop {
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl ReloadLoop {
    /// 请求停止并等待循环退出，返回累计重载次数
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        self.join().await
    }

    /// 等待循环自然结束，返回累计重载次数
    pub async fn join(self) -> u64 {
        match self.task.await {
            Ok(reloads) => reloads,
            Err(e) => {
                warn!("重载循环异常退出: {}", e);
                0
            }
        }
    }

    /// 循环是否已经结束
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// 启动配置重载循环
///
/// 每收到一次变更信号就重新读取一次完整配置并交给 `on_change`。
/// 通知源关闭或收到取消请求时循环结束。
pub fn spawn_reload_loop<F>(provider: SharedProvider, changes: ChangeReceiver, on_change: F) -> ReloadLoop
where
    F: Fn(Vec<u8>) + Send + Sync + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        let mut reloads = 0u64;
        loop {
            let changed = tokio::select! {
                _ = token.cancelled() => break,
                changed = changes.changed() => changed,
            };
            if !changed {
                debug!("变更通知已关闭，重载循环退出");
                break;
            }

            let content = provider.read().await.read_config();
            match content {
                Ok(bytes) => {
                    reloads += 1;
                    debug!("配置已重新读取: {} 字节", bytes.len());
                    on_change(bytes);
                }
                Err(e) => warn!("重新读取配置失败: {}", e),
            }
        }

        info!("重载循环结束，共重载 {} 次", reloads);
        reloads
    });

    ReloadLoop { cancel, task }
}
