//! 对话消息
//!
//! 消息一经创建不可变，只追加；仅在「清空对话」时整体移除。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 失败轮次展示给用户的固定文案
pub const ERROR_REPLY_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// 消息来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    User,
    Assistant,
}

/// 服务端报告的检索 / 回答策略
///
/// 未识别的名字保留原文（Other），日志模板按 general 处理。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    General,
    Vector,
    KnowledgeGraph,
    Hybrid,
    Other(String),
}

impl Strategy {
    pub fn as_str(&self) -> &str {
        match self {
            Strategy::General => "general",
            Strategy::Vector => "vector",
            Strategy::KnowledgeGraph => "knowledge_graph",
            Strategy::Hybrid => "hybrid",
            Strategy::Other(name) => name,
        }
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        match s.as_str() {
            "general" => Strategy::General,
            "vector" => Strategy::Vector,
            "knowledge_graph" => Strategy::KnowledgeGraph,
            "hybrid" => Strategy::Hybrid,
            _ => Strategy::Other(s),
        }
    }
}

impl From<&str> for Strategy {
    fn from(s: &str) -> Self {
        Strategy::from(s.to_string())
    }
}

impl From<Strategy> for String {
    fn from(s: Strategy) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
    pub strategy: Option<Strategy>,
    pub confidence: Option<f64>,
    pub method: Option<String>,
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            origin: Origin::User,
            timestamp,
            strategy: None,
            confidence: None,
            method: None,
            is_error: false,
        }
    }

    pub fn assistant(
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
        strategy: Strategy,
        confidence: f64,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            origin: Origin::Assistant,
            timestamp,
            strategy: Some(strategy),
            confidence: Some(confidence),
            method: Some(method.into()),
            is_error: false,
        }
    }

    pub fn error(timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: ERROR_REPLY_TEXT.to_string(),
            origin: Origin::Assistant,
            timestamp,
            strategy: None,
            confidence: None,
            method: None,
            is_error: true,
        }
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    /// 置信度百分比（四舍五入，0.846 → 85）
    pub fn confidence_percent(&self) -> Option<u32> {
        self.confidence.map(crate::activity::percent)
    }
}
