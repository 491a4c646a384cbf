//! # 示例应用程序
//!
//! 演示宿主如何通过 `remote-config` 配置源读取配置并响应变更。
//! 远程端由内存客户端模拟，后台任务定期发布新的配置内容。

use anyhow::Context;
use clap::Parser;
use config_impl::{parse_source_uri, MemoryRemoteClient};
use infrastructure_composition::{exit_on_fatal, init_logging, RemoteConfigBootstrapper, SettingsLoader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 未提供配置文件和地址时使用的演示配置源
const DEMO_SOURCE_URI: &str =
    "svc://localhost:8080?configKey=app.json&configType=json&namespaceName=application&appId=example-app";

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "远程配置源示例应用")]
struct Args {
    /// 配置源地址
    #[arg(short, long)]
    source: Option<String>,

    /// 是否监听配置变更
    #[arg(long)]
    watch: Option<bool>,

    /// 启动配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long)]
    log_level: Option<String>,

    /// 模拟发布变更的间隔（秒）
    #[arg(long, default_value_t = 2)]
    publish_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = SettingsLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    match (&args.source, &args.config) {
        (Some(source), _) => loader = loader.with_override("source_uri", source.as_str()),
        (None, None) => loader = loader.with_override("source_uri", DEMO_SOURCE_URI),
        (None, Some(_)) => {}
    }
    if let Some(watch) = args.watch {
        loader = loader.with_override("watch", watch);
    }
    if let Some(level) = &args.log_level {
        loader = loader.with_override("logging.level", level.as_str());
    }

    let settings = exit_on_fatal(loader.load().map_err(Into::into));
    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("{}", e);
    }

    info!("启动远程配置源示例应用");

    // 按配置源地址预置演示数据，地址本身的错误留给启动流程报告
    let client = MemoryRemoteClient::new();
    let demo_target = parse_source_uri(&settings.source_uri)
        .ok()
        .map(|descriptor| (descriptor.namespace, descriptor.config_key));
    if let Some((namespace, key)) = &demo_target {
        client.publish(namespace, key, render_demo_config(0));
    }

    let bootstrapper = exit_on_fatal(
        RemoteConfigBootstrapper::new(settings).register_client(Arc::new(client.clone())),
    );
    let mut handle = exit_on_fatal(bootstrapper.bootstrap().await);

    let initial = handle.read_config().await.context("读取初始配置失败")?;
    info!(
        "初始配置 ({}): {}",
        handle.format(),
        String::from_utf8_lossy(&initial)
    );

    handle.start_reload_loop(|bytes| {
        info!("配置已更新: {}", String::from_utf8_lossy(&bytes));
    });

    let publisher = demo_target.map(|(namespace, key)| {
        let client = client.clone();
        let interval = Duration::from_secs(args.publish_interval.max(1));
        tokio::spawn(async move {
            let mut revision = 0u64;
            loop {
                tokio::time::sleep(interval).await;
                revision += 1;
                client.publish(&namespace, &key, render_demo_config(revision));
            }
        })
    });

    info!("按 Ctrl+C 退出");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("等待退出信号失败: {}", e);
    }

    if let Some(publisher) = publisher {
        publisher.abort();
    }

    let reloads = handle.shutdown().await.context("关闭配置源失败")?;
    info!("示例应用已停止，共重载配置 {} 次", reloads);
    Ok(())
}

fn render_demo_config(revision: u64) -> String {
    format!(
        r#"{{"service":"example-app","revision":{},"feature_flags":{{"beta":{}}}}}"#,
        revision,
        revision % 2 == 1
    )
}
