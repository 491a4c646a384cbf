//! # 远程配置源组合层
//!
//! 把远程配置源适配器接入宿主进程：加载启动配置、初始化日志、
//! 显式注册 `remote-config` 提供者、打开配置源并驱动重载循环。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use config_impl::MemoryRemoteClient;
//! use infrastructure_composition::{exit_on_fatal, init_logging, RemoteConfigBootstrapper, SettingsLoader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = exit_on_fatal(SettingsLoader::new().load().map_err(Into::into));
//!     let _ = init_logging(&settings.logging);
//!
//!     let bootstrapper = exit_on_fatal(
//!         RemoteConfigBootstrapper::new(settings).register_client(Arc::new(MemoryRemoteClient::new())),
//!     );
//!     let mut handle = exit_on_fatal(bootstrapper.bootstrap().await);
//!
//!     handle.start_reload_loop(|bytes| println!("配置已更新: {} 字节", bytes.len()));
//!     let _ = handle.shutdown().await;
//! }
//! ```

pub mod bootstrapper;
pub mod fatal;
pub mod logging;
pub mod reload;
pub mod settings;

pub use bootstrapper::{ConfigSourceHandle, RemoteConfigBootstrapper};
pub use fatal::{exit_on_fatal, FATAL_EXIT_CODE};
pub use logging::init_logging;
pub use reload::{spawn_reload_loop, ReloadLoop, SharedProvider};
pub use settings::{BootstrapSettings, LoggingSettings, SettingsLoader, DEFAULT_ENV_PREFIX, DEFAULT_SETTINGS_FILE};

pub use infrastructure_common::InfrastructureError;
