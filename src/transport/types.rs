//! 线上数据格式：/health、/stats、/query 的请求与响应

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ChatError;
use crate::session::Strategy;

/// GET /health 的解析结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireHealth {
    pub status: String,
}

impl From<WireHealth> for HealthStatus {
    fn from(w: WireHealth) -> Self {
        Self {
            healthy: w.status == "healthy",
        }
    }
}

/// POST /query 请求体
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub user_id: String,
    /// 首轮为 null，服务端分配后沿用
    pub session_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// POST /query 响应（已校验）
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub confidence: f64,
    pub method: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct WireQueryResponse {
    response: String,
    timestamp: String,
    strategy: String,
    confidence: f64,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

impl QueryResponse {
    /// 从响应体解析并校验；缺字段或时间戳非法时返回 InvalidResponse
    pub fn from_json(body: &str) -> Result<Self, ChatError> {
        let wire: WireQueryResponse = serde_json::from_str(body)?;
        let timestamp = parse_timestamp(&wire.timestamp)?;
        let session_id = wire
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ChatError::InvalidResponse("missing session_id".to_string()))?;

        let confidence = if (0.0..=1.0).contains(&wire.confidence) {
            wire.confidence
        } else {
            tracing::warn!(confidence = wire.confidence, "Confidence out of range, clamping");
            wire.confidence.clamp(0.0, 1.0)
        };

        Ok(Self {
            response: wire.response,
            timestamp,
            strategy: Strategy::from(wire.strategy),
            confidence,
            method: wire.method.unwrap_or_default(),
            session_id,
        })
    }
}

/// ISO-8601 时间戳；不带时区的按本地时间解释
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ChatError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| ChatError::InvalidResponse(format!("bad timestamp {:?}: {}", raw, e)))?;
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc()))
}
