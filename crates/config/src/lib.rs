//! 统一配置中心
//!
//! 提供中继服务的全局配置管理，包括：
//! - 监听地址与跨域来源
//! - 会话默认值（昵称、头像）
//! - 扇出投递与背压参数
//!
//! 加载顺序：内置默认值 -> 可选配置文件（APP_CONFIG_FILE）-> 环境变量（APP_*，`__` 分隔层级）

use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// 服务配置
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// 中继配置
    #[serde(default)]
    #[validate(nested)]
    pub relay: RelayConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
        }
    }
}

/// 中继配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RelayConfig {
    /// 未提供头像时使用的默认头像
    #[validate(length(min = 1))]
    pub default_avatar: String,
    /// 未提供昵称时合成昵称的前缀
    #[validate(length(min = 1))]
    pub fallback_name_prefix: String,
    /// 合成昵称时截取的连接句柄长度
    #[validate(range(min = 1, max = 64))]
    pub fallback_name_length: usize,
    /// 单条消息最大字符数，0 表示不限制
    pub max_message_length: usize,
    /// 每个连接的出站队列容量
    #[validate(range(min = 1))]
    pub outbound_buffer: usize,
    /// 连续多少次队列已满后驱逐连接
    #[validate(range(min = 1))]
    pub max_lagged_deliveries: u32,
    /// 单个接收者的投递超时（毫秒）
    #[validate(range(min = 1))]
    pub delivery_timeout_ms: u64,
    /// 聊天消息是否回显给发送者
    pub echo_to_sender: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_avatar: "👤".into(),
            fallback_name_prefix: "User".into(),
            fallback_name_length: 6,
            max_message_length: 4000,
            outbound_buffer: 64,
            max_lagged_deliveries: 32,
            delivery_timeout_ms: 2000,
            echo_to_sender: true,
        }
    }
}

impl RelayConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl AppConfig {
    /// 组装配置来源
    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("APP_").split("__"))
    }

    /// 从默认值、配置文件和环境变量加载并验证配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置解析失败: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("配置验证失败: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
