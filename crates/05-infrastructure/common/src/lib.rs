//! # Infrastructure Common
//!
//! 远程配置源适配器的公共类型。
//!
//! ## 核心组件
//!
//! - [`ConfigError`] - 配置错误，区分启动期致命错误与可降级条件
//! - [`InfrastructureError`] - 基础设施启动/关闭错误
//! - [`WatchState`] - 变更监听状态机

pub mod errors;
pub mod state;

pub use errors::*;
pub use state::*;
