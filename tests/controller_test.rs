//! 编排器集成测试：通过 cmd/state 通道驱动，后端为 MockQueryService

use std::sync::Arc;
use std::time::Duration;

use rag_chat::activity::LogAction;
use rag_chat::config::AppConfig;
use rag_chat::core::{
    create_controller_with, spawn_controller, AgentStatus, ChatError, Command, ControllerHandle,
    SessionSnapshot, TurnController, TurnSettings,
};
use rag_chat::session::Strategy;
use rag_chat::transport::mock::{reply, MockQueryService};
use rag_chat::transport::HealthStatus;
use tokio::sync::watch;

fn start(mock: Arc<MockQueryService>) -> ControllerHandle {
    spawn_controller(TurnController::new(mock, TurnSettings::default()))
}

/// 等待快照满足条件（最多 5 秒）
async fn wait_for<F>(rx: &mut watch::Receiver<SessionSnapshot>, pred: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if pred(&snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("controller stopped");
        }
    })
    .await
    .expect("timed out waiting for state")
}

fn actions(s: &SessionSnapshot) -> Vec<LogAction> {
    s.activity.iter().map(|e| e.action).collect()
}

#[tokio::test]
async fn test_send_completes_turn_and_refreshes_stats() {
    let mock = Arc::new(MockQueryService::new());
    mock.push_reply(Ok(reply("OpenAI is an AI company.", Strategy::KnowledgeGraph, 0.91, "s1")));
    mock.set_stats(Ok(serde_json::json!({"total_queries": 1, "total_sessions": 1})));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("What is OpenAI?".to_string()));

    let s = wait_for(&mut rx, |s| s.messages.len() == 2).await;
    assert_eq!(s.messages[0].text, "What is OpenAI?");
    assert_eq!(s.messages[1].text, "OpenAI is an AI company.");
    assert_eq!(s.messages[1].strategy, Some(Strategy::KnowledgeGraph));
    assert_eq!(s.session_id.as_deref(), Some("s1"));
    assert_eq!(s.agent_status, AgentStatus::Ready);
    assert_eq!(actions(&s).len(), 5);

    let s = wait_for(&mut rx, |s| s.stats["total_queries"] == 1).await;
    assert_eq!(s.stats["total_sessions"], 1);
    assert_eq!(mock.stats_calls(), 1);
}

#[tokio::test]
async fn test_second_send_while_submitting_is_dropped() {
    let mock = Arc::new(MockQueryService::new().with_delay(Duration::from_millis(200)));
    mock.push_reply(Ok(reply("first answer", Strategy::Vector, 0.7, "s1")));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("first".to_string()));
    handle.send(Command::Send("second".to_string()));

    let s = wait_for(&mut rx, |s| s.messages.len() == 2 && !s.submitting).await;
    assert_eq!(s.messages[0].text, "first");
    assert_eq!(s.messages[1].text, "first answer");
    assert_eq!(mock.query_calls(), 1);
    assert_eq!(
        actions(&s),
        vec![
            LogAction::EnterTask,
            LogAction::Thought,
            LogAction::ApiRequest,
            LogAction::ApiResponse,
            LogAction::Thought
        ]
    );
}

#[tokio::test]
async fn test_empty_send_does_nothing() {
    let mock = Arc::new(MockQueryService::new());
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("   ".to_string()));
    handle.send(Command::Send("real".to_string()));

    let s = wait_for(&mut rx, |s| s.messages.len() == 2).await;
    assert_eq!(s.messages[0].text, "real");
    assert_eq!(mock.query_calls(), 1);
}

#[tokio::test]
async fn test_clear_while_submitting_discards_late_response() {
    let mock = Arc::new(MockQueryService::new().with_delay(Duration::from_millis(200)));
    mock.push_reply(Ok(reply("late answer", Strategy::Hybrid, 0.9, "s-old")));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("question".to_string()));
    wait_for(&mut rx, |s| s.submitting).await;
    handle.send(Command::Clear);
    let s = wait_for(&mut rx, |s| s.messages.is_empty()).await;
    assert!(!s.submitting);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let s = rx.borrow().clone();
    assert!(s.messages.is_empty());
    assert!(s.activity.is_empty());
    assert!(s.session_id.is_none());
    assert_eq!(s.agent_status, AgentStatus::Ready);
    assert_eq!(mock.stats_calls(), 0);
}

#[tokio::test]
async fn test_network_failure_surfaces_as_error_message() {
    let mock = Arc::new(MockQueryService::new());
    mock.push_reply(Err(ChatError::Network("connection refused".to_string())));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("hello".to_string()));
    let s = wait_for(&mut rx, |s| s.agent_status == AgentStatus::Error).await;
    assert_eq!(s.messages.len(), 2);
    assert!(s.messages[1].is_error);
    assert_eq!(actions(&s), vec![LogAction::EnterTask, LogAction::Error]);

    // 控制器仍可接受下一轮
    handle.send(Command::Send("again".to_string()));
    let s = wait_for(&mut rx, |s| s.messages.len() == 4).await;
    assert_eq!(s.agent_status, AgentStatus::Ready);
}

#[tokio::test]
async fn test_refresh_status_and_stats_failure() {
    let mock = Arc::new(MockQueryService::new());
    mock.set_stats(Ok(serde_json::json!({"total_queries": 7})));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::RefreshStatus);
    let s = wait_for(&mut rx, |s| s.agent_status == AgentStatus::Connected).await;
    assert!(s.connected);

    handle.send(Command::LoadStats);
    wait_for(&mut rx, |s| s.stats["total_queries"] == 7).await;

    mock.set_health(Ok(HealthStatus { healthy: false }));
    mock.set_stats(Err(ChatError::Network("down".to_string())));
    handle.send(Command::LoadStats);
    handle.send(Command::RefreshStatus);
    let s = wait_for(&mut rx, |s| s.agent_status == AgentStatus::Disconnected).await;
    assert!(!s.connected);
    // 统计拉取失败时保留旧值
    assert_eq!(s.stats["total_queries"], 7);
    assert!(s.messages.is_empty());
}

#[tokio::test]
async fn test_clear_is_idempotent_and_keeps_server_state() {
    let mock = Arc::new(MockQueryService::new());
    mock.set_stats(Ok(serde_json::json!({"total_queries": 1})));
    let handle = start(mock.clone());
    let mut rx = handle.state_rx.clone();

    handle.send(Command::RefreshStatus);
    handle.send(Command::Send("hi".to_string()));
    wait_for(&mut rx, |s| s.connected && s.messages.len() == 2 && s.stats["total_queries"] == 1).await;

    handle.send(Command::Clear);
    handle.send(Command::Clear);
    let s = wait_for(&mut rx, |s| s.messages.is_empty()).await;
    assert!(s.activity.is_empty());
    assert!(s.session_id.is_none());
    assert!(s.connected);
    assert_eq!(s.stats["total_queries"], 1);
}

#[tokio::test]
async fn test_quit_stops_loop() {
    let handle = start(Arc::new(MockQueryService::new()));
    handle.send(Command::Quit);
    tokio::time::timeout(Duration::from_secs(5), handle.task)
        .await
        .expect("loop did not stop")
        .expect("task panicked");
}

#[tokio::test]
async fn test_shutdown_token_stops_loop() {
    let handle = start(Arc::new(MockQueryService::new()));
    handle.shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle.task)
        .await
        .expect("loop did not stop")
        .expect("task panicked");
}

#[tokio::test]
async fn test_controller_from_mock_config_echoes() {
    let mut cfg = AppConfig::default();
    cfg.service.mock = true;
    let handle = create_controller_with(&cfg).unwrap();
    let mut rx = handle.state_rx.clone();

    handle.send(Command::Send("ping".to_string()));
    let s = wait_for(&mut rx, |s| s.messages.len() == 2 && !s.submitting).await;
    assert_eq!(s.messages[1].text, "Echo from Mock: ping");
    assert_eq!(s.agent_status, AgentStatus::Ready);
}
