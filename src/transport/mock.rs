//! Mock 服务（离线模式与测试用，无需后端）
//!
//! 脚本队列非空时按顺序返回预置结果；队列为空则回显用户查询（strategy=general）。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::ChatError;
use crate::session::Strategy;

use super::types::{HealthStatus, QueryRequest, QueryResponse};
use super::QueryService;

#[derive(Debug, Default)]
pub struct MockQueryService {
    replies: Mutex<VecDeque<Result<QueryResponse, ChatError>>>,
    health: Mutex<Option<Result<HealthStatus, ChatError>>>,
    stats: Mutex<Option<Result<serde_json::Value, ChatError>>>,
    /// 每次 submit_query 前的人为延迟
    delay: Option<Duration>,
    requests: Mutex<Vec<QueryRequest>>,
    query_calls: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl MockQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 追加一条预置的 /query 结果
    pub fn push_reply(&self, reply: Result<QueryResponse, ChatError>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
    }

    pub fn set_health(&self, health: Result<HealthStatus, ChatError>) {
        if let Ok(mut h) = self.health.lock() {
            *h = Some(health);
        }
    }

    pub fn set_stats(&self, stats: Result<serde_json::Value, ChatError>) {
        if let Ok(mut s) = self.stats.lock() {
            *s = Some(stats);
        }
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// 收到的全部请求（按顺序）
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn echo(request: &QueryRequest) -> QueryResponse {
        QueryResponse {
            response: format!("Echo from Mock: {}", request.query),
            timestamp: Utc::now(),
            strategy: Strategy::General,
            confidence: 1.0,
            method: "mock".to_string(),
            session_id: request
                .session_id
                .clone()
                .unwrap_or_else(|| format!("mock_{}", uuid::Uuid::new_v4())),
        }
    }
}

/// 测试辅助：构造一条成功的响应
pub fn reply(response: &str, strategy: Strategy, confidence: f64, session_id: &str) -> QueryResponse {
    QueryResponse {
        response: response.to_string(),
        timestamp: Utc::now(),
        strategy,
        confidence,
        method: "mock".to_string(),
        session_id: session_id.to_string(),
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn check_health(&self) -> Result<HealthStatus, ChatError> {
        self.health
            .lock()
            .ok()
            .and_then(|h| h.clone())
            .unwrap_or(Ok(HealthStatus { healthy: true }))
    }

    async fn fetch_stats(&self) -> Result<serde_json::Value, ChatError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats
            .lock()
            .ok()
            .and_then(|s| s.clone())
            .unwrap_or_else(|| {
                Ok(serde_json::json!({
                    "total_queries": self.query_calls.load(Ordering::SeqCst),
                }))
            })
    }

    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryResponse, ChatError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut r) = self.requests.lock() {
            r.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        scripted.unwrap_or_else(|| Ok(Self::echo(request)))
    }
}
