//! 会话控制器错误类型
//!
//! 传输层失败统一为 Network / InvalidResponse；空输入在发请求前即被 Validation 拦下。
//! 这些错误全部在 TurnController 内消化为「失败轮次」，不会抛给界面层。

use thiserror::Error;

/// 会话控制器可能出现的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// 服务不可达、超时或返回非 2xx
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx 但响应体无法解析或字段缺失
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 空查询等，在任何网络调用之前拦截
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ChatError::InvalidResponse(e.to_string())
        } else if e.is_timeout() {
            ChatError::Network(format!("request timed out: {}", e))
        } else {
            ChatError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_invalid_response() {
        let err: ChatError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ChatError::InvalidResponse(_)));
    }

    #[test]
    fn test_display() {
        let err = ChatError::Network("HTTP 500".to_string());
        assert_eq!(err.to_string(), "Network error: HTTP 500");
    }
}
