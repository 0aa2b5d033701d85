//! 传输层抽象
//!
//! 所有后端（HTTP / Mock）实现 QueryService。适配器本身无状态、不重试；重试与否由调用方决定。

use async_trait::async_trait;

use crate::core::ChatError;

use super::types::{HealthStatus, QueryRequest, QueryResponse};

#[async_trait]
pub trait QueryService: Send + Sync {
    /// GET /health；不可达或非 2xx 时返回 Network
    async fn check_health(&self) -> Result<HealthStatus, ChatError>;

    /// GET /stats，原样返回 JSON
    async fn fetch_stats(&self) -> Result<serde_json::Value, ChatError>;

    /// POST /query
    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryResponse, ChatError>;
}
