//! 配置变更通知桥
//!
//! 把远程客户端的异步推送回调转换为单槽位、非阻塞的通知通道。
//! 回调可能来自任意线程，可能与 [`ChangeBridge::close`] 并发，也可能在关闭之后才到达；
//! 回调内只做状态检查和一次非阻塞入队。

use crate::adapter::RemoteClientAdapter;
use config_abstractions::{ChangeReceiver, NamespaceChangeEvent, UpdateCallback};
use infrastructure_common::{ConfigError, WatchState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace};

/// 单次回调的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// 信号已放入槽位
    Delivered,
    /// 槽位已有未消费的信号，本次合并
    Coalesced,
    /// 非监听命名空间的事件
    Ignored,
    /// 未启用或已关闭，丢弃
    Discarded,
}

/// 通知桥统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// 放入槽位的信号数
    pub delivered: u64,
    /// 被合并的信号数
    pub coalesced: u64,
    /// 被丢弃的回调数
    pub discarded: u64,
}

struct BridgeShared {
    state: Arc<AtomicU8>,
    sender: Mutex<Option<mpsc::Sender<()>>>,
    delivered: AtomicU64,
    coalesced: AtomicU64,
    discarded: AtomicU64,
}

impl BridgeShared {
    fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn signal(&self, watched_namespace: &str, event: &NamespaceChangeEvent) -> SignalOutcome {
        if self.state() != WatchState::Enabled {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            trace!("通知桥未处于监听状态，丢弃变更: {}", event.namespace);
            return SignalOutcome::Discarded;
        }

        if event.namespace != watched_namespace {
            trace!("忽略非监听命名空间的变更: {}", event.namespace);
            return SignalOutcome::Ignored;
        }

        let sender = self.sender.lock();
        // 持锁复查，close 在同一把锁下取走发送端
        if self.state() != WatchState::Enabled {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return SignalOutcome::Discarded;
        }

        let Some(sender) = sender.as_ref() else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return SignalOutcome::Discarded;
        };

        match sender.try_send(()) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "配置变更信号已投递: namespace={}, changes={}",
                    event.namespace,
                    event.changes.len()
                );
                SignalOutcome::Delivered
            }
            Err(TrySendError::Full(())) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                trace!("已有未消费的变更信号，合并本次变更");
                SignalOutcome::Coalesced
            }
            Err(TrySendError::Closed(())) => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
                SignalOutcome::Discarded
            }
        }
    }
}

/// 配置变更通知桥
pub struct ChangeBridge {
    shared: Arc<BridgeShared>,
    receiver: ChangeReceiver,
}

impl std::fmt::Debug for ChangeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBridge")
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ChangeBridge {
    /// 创建处于 `Disabled` 状态的通知桥
    ///
    /// 通道在此时就已分配，`Disabled` 状态下它保持打开但永不触发。
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        let state = Arc::new(AtomicU8::new(WatchState::Disabled.as_u8()));

        Self {
            shared: Arc::new(BridgeShared {
                state: state.clone(),
                sender: Mutex::new(Some(sender)),
                delivered: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
            receiver: ChangeReceiver::new(receiver, state),
        }
    }

    /// 启用监听：`Disabled -> Enabled`，并向适配器注册更新回调
    pub fn enable(&self, adapter: &RemoteClientAdapter) -> Result<(), ConfigError> {
        match self.shared.state.compare_exchange(
            WatchState::Disabled.as_u8(),
            WatchState::Enabled.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(current) if WatchState::from_u8(current).is_closed() => {
                return Err(ConfigError::AlreadyClosed);
            }
            Err(_) => return Err(ConfigError::CallbackAlreadyRegistered),
        }

        if let Err(e) = adapter.register_update_callback(self.callback(adapter.namespace())) {
            // 注册失败时回到 Disabled，除非期间已被关闭
            let _ = self.shared.state.compare_exchange(
                WatchState::Enabled.as_u8(),
                WatchState::Disabled.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return Err(e);
        }

        info!("启用配置变更监听: namespace={}", adapter.namespace());
        Ok(())
    }

    /// 构造交给远程客户端的更新回调
    ///
    /// 回调只持有共享状态，通知桥关闭后仍可被安全调用。
    pub fn callback(&self, watched_namespace: &str) -> UpdateCallback {
        let shared = Arc::clone(&self.shared);
        let namespace = watched_namespace.to_string();
        Arc::new(move |event: &NamespaceChangeEvent| {
            shared.signal(&namespace, event);
        })
    }

    /// 直接投递一次变更事件，返回处理结果
    pub fn notify(&self, watched_namespace: &str, event: &NamespaceChangeEvent) -> SignalOutcome {
        self.shared.signal(watched_namespace, event)
    }

    /// 关闭通知桥
    ///
    /// 状态转换只发生一次，第一次调用返回 `true`。返回之后不会再有信号投递。
    pub fn close(&self) -> bool {
        let previous = WatchState::from_u8(
            self.shared
                .state
                .swap(WatchState::Closed.as_u8(), Ordering::AcqRel),
        );
        if previous.is_closed() {
            debug!("通知桥已关闭");
            return false;
        }

        // 取走发送端即关闭通道；正在投递的回调持有同一把锁，会先完成
        let sender = self.shared.sender.lock().take();
        drop(sender);

        info!("关闭配置变更通知桥: 之前状态={}", previous);
        true
    }

    /// 获取变更接收器
    pub fn receiver(&self) -> ChangeReceiver {
        self.receiver.clone()
    }

    /// 获取当前状态
    pub fn state(&self) -> WatchState {
        self.shared.state()
    }

    /// 获取统计信息
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            coalesced: self.shared.coalesced.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for ChangeBridge {
    fn default() -> Self {
        Self::new()
    }
}
