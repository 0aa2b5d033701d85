//! 轮次控制器：一次「用户提问 → 服务回答 / 失败」的显式状态机
//!
//! 状态：Idle → Submitting → {Completed, Failed} → Idle。
//! - begin：挂起点之前同步追加用户消息与 EnterTask 日志，返回待提交的 PendingTurn
//! - execute：唯一的挂起点（网络调用，带默认超时），不触碰状态
//! - complete：恢复点，按 epoch / turn_id 判断结果是否过期，再一次性应用到 SessionStore
//!
//! 会话被清空时 epoch 自增；清空前发出的请求即使稍后返回，也会被丢弃。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::watch;

use crate::activity::{enter_task, error_entry, synthesize};
use crate::config::AppConfig;
use crate::core::state::{AgentStatus, SessionSnapshot, SessionStore};
use crate::core::ChatError;
use crate::session::{Message, Strategy};
use crate::transport::{HealthStatus, QueryRequest, QueryResponse, QueryService};

/// 轮次阶段；Completed / Failed 为瞬时状态，应用后立即回到 Idle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Submitting { turn_id: u64 },
}

/// 已开始、等待网络结果的轮次
#[derive(Clone, Debug)]
pub struct PendingTurn {
    pub turn_id: u64,
    pub epoch: u64,
    pub request: QueryRequest,
}

/// complete 的结果
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// 已追加助手消息；调用方应异步刷新统计
    Completed { strategy: Strategy, confidence: f64 },
    /// 已追加错误消息
    Failed(ChatError),
    /// 结果过期（期间清空过会话），未做任何变更
    Discarded,
    /// 已有轮次在途，本次发送被丢弃（不排队）
    Busy,
}

/// 每轮请求共用的参数
#[derive(Clone, Debug)]
pub struct TurnSettings {
    pub user_id: String,
    pub metadata: HashMap<String, String>,
    pub timeout: Duration,
}

impl TurnSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            user_id: cfg.app.user_id.clone(),
            metadata: cfg.service.metadata.clone(),
            timeout: Duration::from_secs(cfg.service.timeouts.request),
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 墙钟标签，用于活动日志
fn clock_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// 挂起点：调用传输层并施加默认超时
pub async fn execute(
    service: &dyn QueryService,
    request: &QueryRequest,
    timeout: Duration,
) -> Result<QueryResponse, ChatError> {
    match tokio::time::timeout(timeout, service.submit_query(request)).await {
        Ok(result) => result,
        Err(_) => Err(ChatError::Network(format!(
            "request timed out after {}s",
            timeout.as_secs_f64()
        ))),
    }
}

/// 轮次控制器：SessionStore 的唯一写者
pub struct TurnController {
    store: SessionStore,
    service: Arc<dyn QueryService>,
    settings: TurnSettings,
    phase: TurnPhase,
    /// 会话代次，clear 时自增
    epoch: u64,
    next_turn_id: u64,
}

impl TurnController {
    pub fn new(service: Arc<dyn QueryService>, settings: TurnSettings) -> Self {
        Self {
            store: SessionStore::new(),
            service,
            settings,
            phase: TurnPhase::Idle,
            epoch: 0,
            next_turn_id: 0,
        }
    }

    pub fn service(&self) -> Arc<dyn QueryService> {
        self.service.clone()
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, TurnPhase::Submitting { .. })
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    /// Idle → Submitting
    ///
    /// 空白输入返回 Validation（无任何变更）；已有轮次在途返回 Ok(None)（丢弃，不排队）。
    pub fn begin(&mut self, input: &str) -> Result<Option<PendingTurn>, ChatError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ChatError::Validation("query is empty".to_string()));
        }
        if self.is_submitting() {
            tracing::debug!("Turn already in flight, dropping send");
            return Ok(None);
        }

        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;
        self.phase = TurnPhase::Submitting { turn_id };

        let time = clock_label();
        self.store.batch(|b| {
            b.push_message(Message::user(query, Utc::now()));
            let entry = enter_task(query, &time, b.ids());
            b.extend_activity([entry]);
            b.set_status(AgentStatus::Processing);
            b.set_submitting(true);
        });

        let request = QueryRequest {
            query: query.to_string(),
            user_id: self.settings.user_id.clone(),
            session_id: self.store.snapshot().session_id.clone(),
            metadata: self.settings.metadata.clone(),
        };
        Ok(Some(PendingTurn {
            turn_id,
            epoch: self.epoch,
            request,
        }))
    }

    fn is_current(&self, turn: &PendingTurn) -> bool {
        turn.epoch == self.epoch && self.phase == TurnPhase::Submitting { turn_id: turn.turn_id }
    }

    /// Submitting → Completed / Failed → Idle
    pub fn complete(
        &mut self,
        turn: &PendingTurn,
        result: Result<QueryResponse, ChatError>,
    ) -> TurnOutcome {
        if !self.is_current(turn) {
            tracing::debug!(
                turn_id = turn.turn_id,
                turn_epoch = turn.epoch,
                epoch = self.epoch,
                "Discarding stale turn result"
            );
            return TurnOutcome::Discarded;
        }
        self.phase = TurnPhase::Idle;

        let time = clock_label();
        let query = turn.request.query.as_str();
        match result {
            Ok(resp) => {
                let strategy = resp.strategy.clone();
                let confidence = resp.confidence;
                self.store.batch(|b| {
                    b.push_message(Message::assistant(
                        resp.response,
                        resp.timestamp,
                        strategy.clone(),
                        confidence,
                        resp.method,
                    ));
                    b.assign_session_id(resp.session_id);
                    b.set_current_strategy(strategy.clone());
                    b.set_status(AgentStatus::Ready);
                    let entries = synthesize(query, &strategy, confidence, &time, b.ids());
                    b.extend_activity(entries);
                    b.set_submitting(false);
                });
                tracing::info!(
                    turn_id = turn.turn_id,
                    strategy = %strategy,
                    confidence,
                    "Response received"
                );
                TurnOutcome::Completed {
                    strategy,
                    confidence,
                }
            }
            Err(e) => {
                tracing::warn!(turn_id = turn.turn_id, error = %e, "Turn failed");
                self.store.batch(|b| {
                    b.push_message(Message::error(Utc::now()));
                    let entry = error_entry(&time, b.ids());
                    b.extend_activity([entry]);
                    b.set_status(AgentStatus::Error);
                    b.set_submitting(false);
                });
                TurnOutcome::Failed(e)
            }
        }
    }

    /// 完整跑一轮：begin → execute → complete（简单宿主与测试用）
    pub async fn run_turn(&mut self, input: &str) -> Result<TurnOutcome, ChatError> {
        let Some(turn) = self.begin(input)? else {
            return Ok(TurnOutcome::Busy);
        };
        let service = self.service.clone();
        let result = execute(service.as_ref(), &turn.request, self.settings.timeout).await;
        Ok(self.complete(&turn, result))
    }

    /// 清空会话；在途请求不取消，其结果将因 epoch 变化被丢弃
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.phase = TurnPhase::Idle;
        self.store.clear();
    }

    /// 应用健康检查结果：只改连接标志，以及（无轮次在途时）Connected / Disconnected 状态
    pub fn apply_health(&mut self, result: Result<HealthStatus, ChatError>) {
        let healthy = match result {
            Ok(h) => h.healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Connection check failed");
                false
            }
        };
        let submitting = self.is_submitting();
        self.store.batch(|b| {
            b.set_connectivity(healthy);
            if !submitting {
                b.set_status(if healthy {
                    AgentStatus::Connected
                } else {
                    AgentStatus::Disconnected
                });
            }
        });
    }

    /// 应用统计结果；失败时保留旧值
    pub fn apply_stats(&mut self, result: Result<serde_json::Value, ChatError>) {
        match result {
            Ok(stats) => self.store.set_stats(stats),
            Err(e) => tracing::warn!(error = %e, "Failed to load stats"),
        }
    }

    /// 同步刷新连接状态
    pub async fn refresh_health(&mut self) {
        let result = self.service.check_health().await;
        self.apply_health(result);
    }

    /// 同步刷新统计
    pub async fn refresh_stats(&mut self) {
        let result = self.service.fetch_stats().await;
        self.apply_stats(result);
    }
}
