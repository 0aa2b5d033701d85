//! 传输适配层：QueryService 抽象与 HTTP / Mock 实现

pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

use std::sync::Arc;

pub use http::HttpQueryService;
pub use mock::MockQueryService;
pub use traits::QueryService;
pub use types::{parse_timestamp, HealthStatus, QueryRequest, QueryResponse};

use crate::config::AppConfig;

/// 根据配置选择后端：service.mock=true 时用回显 Mock，否则走 HTTP
pub fn create_service_from_config(cfg: &AppConfig) -> anyhow::Result<Arc<dyn QueryService>> {
    if cfg.service.mock {
        tracing::warn!("service.mock enabled, using Mock query service");
        return Ok(Arc::new(MockQueryService::new()));
    }
    let svc = HttpQueryService::from_config(&cfg.service)?;
    tracing::info!("Using RAG service at {}", svc.base_url());
    Ok(Arc::new(svc))
}
