//! HTTP 传输：基于 reqwest 调用 RAG 服务的 /health、/stats、/query
//!
//! 单个 Client 复用连接池；请求超时与连接超时来自配置。非 2xx 一律视为 Network 错误。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::config::ServiceSection;
use crate::core::ChatError;

use super::types::{HealthStatus, QueryRequest, QueryResponse, WireHealth};
use super::QueryService;

pub struct HttpQueryService {
    client: Client,
    base_url: String,
}

impl HttpQueryService {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("rag-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &ServiceSection) -> Result<Self, ChatError> {
        Self::new(
            &cfg.base_url,
            Duration::from_secs(cfg.timeouts.request),
            Duration::from_secs(cfg.timeouts.connect),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 非 2xx 转 Network，成功时读出响应体
    async fn body(resp: Response) -> Result<String, ChatError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::Network(format!("HTTP {}", status)));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn check_health(&self) -> Result<HealthStatus, ChatError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        let body = Self::body(resp).await?;
        let wire: WireHealth = serde_json::from_str(&body)?;
        Ok(wire.into())
    }

    async fn fetch_stats(&self) -> Result<serde_json::Value, ChatError> {
        let resp = self.client.get(self.url("/stats")).send().await?;
        let body = Self::body(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryResponse, ChatError> {
        tracing::debug!(url = %self.url("/query"), session_id = ?request.session_id, "Submitting query");
        let resp = self
            .client
            .post(self.url("/query"))
            .json(request)
            .send()
            .await?;
        let body = Self::body(resp).await?;
        QueryResponse::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let svc = HttpQueryService::new(
            "http://localhost:8000/",
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(svc.base_url(), "http://localhost:8000");
        assert_eq!(svc.url("/health"), "http://localhost:8000/health");
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        // 端口 9 (discard) 基本不会有 HTTP 服务监听
        let svc = HttpQueryService::new(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            Duration::from_millis(500),
        )
        .unwrap();
        let err = svc.check_health().await.unwrap_err();
        assert!(matches!(err, ChatError::Network(_)), "unexpected error: {:?}", err);
    }
}
