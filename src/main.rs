//! rag-chat 入口：加载配置、初始化日志、启动会话控制器与 TUI，并运行主循环。

use std::path::PathBuf;

use anyhow::Context;
use rag_chat::config::{load_config, AppConfig};
use rag_chat::core::create_controller_with;
use rag_chat::{observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config(None);

    // TUI 占用终端，日志写文件；默认 info，可通过 RUST_LOG 覆盖
    let log_file = cfg
        .as_ref()
        .ok()
        .and_then(|c| c.app.log_file.clone())
        .unwrap_or_else(|| PathBuf::from("rag-chat.log"));
    observability::init_file(&log_file);

    let cfg = cfg.unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let handle = create_controller_with(&cfg).context("Failed to create session controller")?;

    run_app(handle.state_rx.clone(), handle.cmd_tx.clone())
        .await
        .context("App run failed")?;

    handle.shutdown.cancel();
    let _ = handle.task.await;
    Ok(())
}
