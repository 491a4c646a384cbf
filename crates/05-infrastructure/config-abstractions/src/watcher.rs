//! 配置变更通知的只读端

use infrastructure_common::WatchState;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// 配置变更接收器
///
/// 包装容量为 1 的通知通道。克隆出的接收器共享同一个槽位，
/// 因此一次变更只会被其中一个消费者取走。
///
/// 未启用监听时通道保持打开但永不触发；关闭之后任何滞留的信号都不会再交付。
#[derive(Clone)]
pub struct ChangeReceiver {
    receiver: Arc<Mutex<mpsc::Receiver<()>>>,
    state: Arc<AtomicU8>,
}

impl std::fmt::Debug for ChangeReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeReceiver")
            .field("state", &self.state())
            .finish()
    }
}

impl ChangeReceiver {
    /// 创建新的变更接收器
    pub fn new(receiver: mpsc::Receiver<()>, state: Arc<AtomicU8>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            state,
        }
    }

    /// 等待下一次变更
    ///
    /// 返回 `true` 表示配置可能已变化；返回 `false` 表示通知源已关闭，之后不会再有变更。
    /// 该 future 可以安全地放进 `tokio::select!`。
    pub async fn changed(&self) -> bool {
        if self.is_closed() {
            return false;
        }

        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(()) => !self.is_closed(),
            None => false,
        }
    }

    /// 非阻塞地检查是否有待处理的变更，有则取走
    pub fn try_changed(&self) -> bool {
        if self.is_closed() {
            return false;
        }

        let Ok(mut receiver) = self.receiver.try_lock() else {
            return false;
        };
        receiver.try_recv().is_ok() && !self.is_closed()
    }

    /// 获取当前监听状态
    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 通知源是否已关闭
    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }
}
