//! 核心层：错误、会话状态、轮次状态机、编排主循环

pub mod error;
pub mod orchestrator;
pub mod state;
pub mod turn;

pub use error::ChatError;
pub use orchestrator::{create_controller_with, spawn_controller, Command, ControllerHandle};
pub use state::{AgentStatus, SessionSnapshot, SessionStore};
pub use turn::{PendingTurn, TurnController, TurnOutcome, TurnPhase, TurnSettings};
