//! 会话状态：唯一可变数据源 SessionStore 与其对外快照 SessionSnapshot
//!
//! 只允许编排器（单写者）调用变更方法；每次变更后整体发布一份快照到 watch 通道，
//! 读者（UI）只会看到完整应用后的状态，不会看到「半条消息」。

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

use crate::activity::{ActivityLogEntry, EntryIds};
use crate::session::{Message, Strategy};

/// 智能体状态（UI 投影用）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AgentStatus {
    Ready,
    Processing,
    Connected,
    Disconnected,
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Ready => "Ready",
            AgentStatus::Processing => "Processing...",
            AgentStatus::Connected => "Connected",
            AgentStatus::Disconnected => "Disconnected",
            AgentStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

/// UI 看到的完整状态快照
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub messages: Vec<Message>,
    pub agent_status: AgentStatus,
    pub connected: bool,
    pub stats: serde_json::Value,
    pub current_strategy: Option<Strategy>,
    pub activity: Vec<ActivityLogEntry>,
    /// 有轮次在途时为 true，UI 据此锁定输入
    pub submitting: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            messages: Vec::new(),
            agent_status: AgentStatus::Ready,
            connected: false,
            stats: serde_json::Value::Object(Default::default()),
            current_strategy: None,
            activity: Vec::new(),
            submitting: false,
        }
    }
}

/// 会话存储：消息历史、会话 ID、状态标志、统计与活动日志
pub struct SessionStore {
    state: SessionSnapshot,
    /// 活动日志 ID 发生器，clear 时不重置，保持全局单调
    ids: EntryIds,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let state = SessionSnapshot::default();
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            state,
            ids: EntryIds::new(),
            tx,
        }
    }

    /// 订阅快照；即使当前没有订阅者，store 也照常工作
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.state
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.clone());
    }

    /// 追加消息；时间戳早于上一条时抬到上一条，保证单调不减
    pub fn append_message(&mut self, message: Message) {
        self.batch(|b| b.push_message(message));
    }

    /// 仅在尚未分配时写入；之后保持稳定直到 clear
    pub fn set_session_id(&mut self, session_id: impl Into<String>) -> bool {
        self.batch(|b| b.assign_session_id(session_id))
    }

    pub fn set_status(&mut self, status: AgentStatus) {
        self.batch(|b| b.set_status(status));
    }

    pub fn set_connectivity(&mut self, connected: bool) {
        self.batch(|b| b.set_connectivity(connected));
    }

    pub fn set_stats(&mut self, stats: serde_json::Value) {
        self.batch(|b| b.set_stats(stats));
    }

    pub fn set_current_strategy(&mut self, strategy: Strategy) {
        self.batch(|b| b.set_current_strategy(strategy));
    }

    pub fn append_activity(&mut self, entries: impl IntoIterator<Item = ActivityLogEntry>) {
        self.batch(|b| b.extend_activity(entries));
    }

    /// 多项变更合并为一次发布
    pub(crate) fn batch<R>(&mut self, f: impl FnOnce(&mut SessionBatch<'_>) -> R) -> R {
        let mut batch = SessionBatch {
            state: &mut self.state,
            ids: &mut self.ids,
        };
        let out = f(&mut batch);
        self.publish();
        out
    }

    /// 清空对话：消息、会话 ID、当前策略、活动日志，状态回到 Ready；连接与统计保持不变
    pub fn clear(&mut self) {
        self.state.messages.clear();
        self.state.session_id = None;
        self.state.current_strategy = None;
        self.state.activity.clear();
        self.state.agent_status = AgentStatus::Ready;
        self.state.submitting = false;
        self.publish();
    }
}

/// 一次发布内的变更句柄；各项不变式只在这里实现
pub(crate) struct SessionBatch<'a> {
    state: &'a mut SessionSnapshot,
    ids: &'a mut EntryIds,
}

impl SessionBatch<'_> {
    pub(crate) fn push_message(&mut self, mut message: Message) {
        if let Some(last) = self.state.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.state.messages.push(message);
    }

    pub(crate) fn assign_session_id(&mut self, session_id: impl Into<String>) -> bool {
        if self.state.session_id.is_some() {
            return false;
        }
        self.state.session_id = Some(session_id.into());
        true
    }

    pub(crate) fn set_status(&mut self, status: AgentStatus) {
        self.state.agent_status = status;
    }

    pub(crate) fn set_connectivity(&mut self, connected: bool) {
        self.state.connected = connected;
    }

    pub(crate) fn set_stats(&mut self, stats: serde_json::Value) {
        self.state.stats = stats;
    }

    pub(crate) fn set_current_strategy(&mut self, strategy: Strategy) {
        self.state.current_strategy = Some(strategy);
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.state.submitting = submitting;
    }

    pub(crate) fn extend_activity(&mut self, entries: impl IntoIterator<Item = ActivityLogEntry>) {
        self.state.activity.extend(entries);
    }

    pub(crate) fn ids(&mut self) -> &mut EntryIds {
        &mut *self.ids
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
