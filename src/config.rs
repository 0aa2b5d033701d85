//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `RAG_CHAT__*` 覆盖（双下划线表示嵌套，如 `RAG_CHAT__SERVICE__BASE_URL=http://host:8000`）。

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub service: ServiceSection,
}

/// [app] 段：应用名、用户标识、日志文件
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 随每次查询发送的 user_id
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// TUI 占用终端时日志写入的文件，未设置时用 ./rag-chat.log
    pub log_file: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            user_id: default_user_id(),
            log_file: None,
        }
    }
}

fn default_user_id() -> String {
    "frontend_user".to_string()
}

/// [service] 段：RAG 服务地址、Mock 开关、请求元数据、超时
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 为 true 时不连后端，使用回显 Mock
    #[serde(default)]
    pub mock: bool,
    /// 随每次查询发送的 metadata
    #[serde(default = "default_metadata")]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub timeouts: TimeoutsSection,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mock: false,
            metadata: default_metadata(),
            timeouts: TimeoutsSection::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_metadata() -> HashMap<String, String> {
    HashMap::from([("client".to_string(), "rag_chat_tui".to_string())])
}

/// [service.timeouts] 段（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsSection {
    /// 单次请求总超时，同时限定「提交中」状态的最长时间
    #[serde(default = "default_request_timeout")]
    pub request: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect: u64,
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
            connect: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

/// 从 config 目录加载配置，环境变量 RAG_CHAT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 RAG_CHAT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("RAG_CHAT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
