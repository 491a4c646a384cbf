//! # Configuration Abstractions
//!
//! 远程配置源抽象层，定义配置源适配器的核心接口和约定。
//!
//! ## 核心接口
//!
//! - [`ConfigSourceProvider`] - 配置源提供者接口 (`parse / read_config / close / is_config_changed`)
//! - [`ProviderRegistry`] - 配置源注册表接口
//! - [`RemoteConfigClient`] / [`RemoteSession`] - 远程配置客户端能力
//! - [`ChangeReceiver`] - 配置变更通知的只读端
//! - [`ConnectionDescriptor`] - 配置源连接描述

pub mod client;
pub mod descriptor;
pub mod events;
pub mod provider;
pub mod watcher;

pub use client::*;
pub use descriptor::*;
pub use events::*;
pub use provider::*;
pub use watcher::*;
