//! 活动日志：条目类型与合成器
//!
//! 日志是对服务端返回元数据的「演绎」，并非服务端真实的执行轨迹。

pub mod entry;
pub mod synthesizer;

pub use entry::{ActivityLogEntry, EntryIds, LogAction, LogAgent};
pub use synthesizer::{enter_task, error_entry, percent, synthesize, ERROR_LOG_TEXT};
