//! 远程配置客户端实现

pub mod memory;
pub mod polling;

pub use memory::MemoryRemoteClient;
pub use polling::{diff_snapshots, NamespaceSnapshot, PollingRemoteClient, SnapshotSource, DEFAULT_POLL_INTERVAL};
