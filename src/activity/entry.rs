//! 活动日志条目
//!
//! 与对话消息平行的只追加序列，随「清空对话」一起清空。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 条目的发出方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAgent {
    Customer,
    Assistant,
}

impl fmt::Display for LogAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogAgent::Customer => f.write_str("Customer"),
            LogAgent::Assistant => f.write_str("GenerativeAgent"),
        }
    }
}

/// 条目动作；kind() 为对应的机器名
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    EnterTask,
    Thought,
    ApiRequest,
    ApiResponse,
    Error,
}

impl LogAction {
    pub fn kind(&self) -> &'static str {
        match self {
            LogAction::EnterTask => "task",
            LogAction::Thought => "thought",
            LogAction::ApiRequest => "api_request",
            LogAction::ApiResponse => "api_response",
            LogAction::Error => "error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogAction::EnterTask => "Enter Task",
            LogAction::Thought => "Thought",
            LogAction::ApiRequest => "API Request",
            LogAction::ApiResponse => "API Response",
            LogAction::Error => "Error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: u64,
    pub agent: LogAgent,
    /// 墙钟时间（HH:MM:SS）
    pub time: String,
    pub action: LogAction,
    pub content: String,
}

impl ActivityLogEntry {
    pub fn kind(&self) -> &'static str {
        self.action.kind()
    }
}

/// 条目 ID 发生器：单调递增计数器，保证同输入同输出
#[derive(Clone, Debug, Default)]
pub struct EntryIds {
    next: u64,
}

impl EntryIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub(crate) fn entry(
        &mut self,
        agent: LogAgent,
        time: &str,
        action: LogAction,
        content: impl Into<String>,
    ) -> ActivityLogEntry {
        ActivityLogEntry {
            id: self.next_id(),
            agent,
            time: time.to_string(),
            action,
            content: content.into(),
        }
    }
}
