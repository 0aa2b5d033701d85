//! 会话编排器：主控循环
//!
//! 负责：按配置创建传输层与 TurnController、建立 cmd/state 两通道，
//! 并在后台任务中消费用户命令（Send/Clear/RefreshStatus/LoadStats/Quit）。
//! 网络调用在独立任务中执行，结果以内部事件回到本循环再应用，因此本循环是 SessionStore 的唯一写者，
//! 且在轮次在途时仍能及时处理 Clear 与（被丢弃的）重复 Send。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::turn::{execute, PendingTurn, TurnController, TurnOutcome, TurnSettings};
use crate::core::{ChatError, SessionSnapshot};
use crate::transport::{create_service_from_config, HealthStatus, QueryResponse, QueryService};

/// 从 UI 发往编排器的用户意图
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 发送一轮提问；有轮次在途时丢弃
    Send(String),
    /// 清空对话与活动日志
    Clear,
    /// 重新检查服务连接
    RefreshStatus,
    /// 拉取服务统计
    LoadStats,
    /// 退出
    Quit,
}

/// 网络任务完成后回送给主循环的事件
enum Event {
    TurnFinished(PendingTurn, Result<QueryResponse, ChatError>),
    Health(Result<HealthStatus, ChatError>),
    Stats(Result<serde_json::Value, ChatError>),
}

/// 编排器句柄：命令发送端、状态接收端、停止令牌与后台任务
pub struct ControllerHandle {
    pub cmd_tx: mpsc::UnboundedSender<Command>,
    pub state_rx: watch::Receiver<SessionSnapshot>,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn send(&self, cmd: Command) {
        let _ = self.cmd_tx.send(cmd);
    }
}

fn spawn_health(service: Arc<dyn QueryService>, tx: mpsc::UnboundedSender<Event>) {
    tokio::spawn(async move {
        let result = service.check_health().await;
        let _ = tx.send(Event::Health(result));
    });
}

fn spawn_stats(service: Arc<dyn QueryService>, tx: mpsc::UnboundedSender<Event>) {
    tokio::spawn(async move {
        let result = service.fetch_stats().await;
        let _ = tx.send(Event::Stats(result));
    });
}

fn spawn_turn(
    service: Arc<dyn QueryService>,
    turn: PendingTurn,
    timeout: Duration,
    tx: mpsc::UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let result = execute(service.as_ref(), &turn.request, timeout).await;
        let _ = tx.send(Event::TurnFinished(turn, result));
    });
}

/// 在后台任务中运行给定的 TurnController
pub fn spawn_controller(mut controller: TurnController) -> ControllerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let state_rx = controller.subscribe();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else {
                        break; // 所有 cmd_tx 已关闭
                    };
                    match cmd {
                        Command::Send(input) => match controller.begin(&input) {
                            Ok(Some(turn)) => {
                                spawn_turn(
                                    controller.service(),
                                    turn,
                                    controller.settings().timeout,
                                    event_tx.clone(),
                                );
                            }
                            Ok(None) => {}
                            Err(e) => tracing::debug!(error = %e, "Send ignored"),
                        },
                        Command::Clear => {
                            controller.clear();
                            tracing::info!("Chat cleared");
                        }
                        Command::RefreshStatus => {
                            spawn_health(controller.service(), event_tx.clone());
                        }
                        Command::LoadStats => {
                            spawn_stats(controller.service(), event_tx.clone());
                        }
                        Command::Quit => break,
                    }
                }
                Some(event) = event_rx.recv() => match event {
                    Event::TurnFinished(turn, result) => {
                        if let TurnOutcome::Completed { .. } = controller.complete(&turn, result) {
                            // 统计刷新失败不影响本轮结果
                            spawn_stats(controller.service(), event_tx.clone());
                        }
                    }
                    Event::Health(result) => controller.apply_health(result),
                    Event::Stats(result) => controller.apply_stats(result),
                },
            }
        }
        tracing::debug!("Controller loop stopped");
    });

    ControllerHandle {
        cmd_tx,
        state_rx,
        shutdown,
        task,
    }
}

/// 创建会话控制器：按配置选择传输后端并启动主循环
pub fn create_controller_with(cfg: &AppConfig) -> anyhow::Result<ControllerHandle> {
    let service = create_service_from_config(cfg)?;
    let controller = TurnController::new(service, TurnSettings::from_config(cfg));
    Ok(spawn_controller(controller))
}
