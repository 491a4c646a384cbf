//! 启动期致命错误处理

use infrastructure_common::InfrastructureError;
use tracing::error;

/// 配置错误退出码（sysexits 的 EX_CONFIG）
pub const FATAL_EXIT_CODE: i32 = 78;

/// 启动期错误导致进程终止
///
/// 宿主在没有可用配置时无法继续运行，因此这里记录错误并直接退出，不做重试。
pub fn exit_on_fatal<T>(result: Result<T, InfrastructureError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(fatal = e.is_fatal(), "配置启动失败，进程终止: {}", e);
            eprintln!("fatal: {}", e);
            std::process::exit(FATAL_EXIT_CODE)
        }
    }
}
