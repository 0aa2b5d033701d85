//! rag-chat - RAG 问答服务的单会话聊天客户端
//!
//! 模块划分：
//! - **activity**: 活动日志条目与合成器（由回答元数据演绎「思考 / 调用 / 返回」轨迹）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、会话状态、轮次状态机、编排主循环
//! - **observability**: tracing 日志初始化
//! - **session**: 消息与策略
//! - **transport**: RAG 服务传输层（HTTP / Mock）
//! - **ui**: Ratatui TUI 界面

pub mod activity;
pub mod config;
pub mod core;
pub mod observability;
pub mod session;
pub mod transport;
pub mod ui;
