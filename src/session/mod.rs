//! 会话数据：消息、来源、策略

pub mod message;

pub use message::{Message, Origin, Strategy, ERROR_REPLY_TEXT};
