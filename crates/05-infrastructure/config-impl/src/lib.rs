//! # Configuration Implementation
//!
//! 远程配置源适配器的具体实现。
//!
//! ## 主要组件
//!
//! - [`parse_source_uri`] - 配置源地址解析
//! - [`RemoteClientAdapter`] - 远程配置客户端适配器
//! - [`ChangeBridge`] - 配置变更通知桥
//! - [`RemoteConfigProvider`] - 远程配置源提供者
//! - [`ConfigSourceRegistry`] - 配置源注册表
//! - [`MemoryRemoteClient`] / [`PollingRemoteClient`] - 远程客户端实现

pub mod adapter;
pub mod bridge;
pub mod clients;
pub mod parser;
pub mod provider;
pub mod registry;

pub use adapter::*;
pub use bridge::*;
pub use clients::*;
pub use parser::*;
pub use provider::*;
pub use registry::*;

#[cfg(test)]
mod tests;
