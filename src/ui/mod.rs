//! TUI 层：Ratatui + crossterm，主循环（app）、事件（event）、渲染（render）、回复排版（format）

pub mod app;
pub mod event;
pub mod format;
pub mod render;

pub use app::run_app;
pub use event::EventHandler;
pub use format::format_message;
pub use render::{draw, ViewState};
