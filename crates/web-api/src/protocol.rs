//! 客户端到服务端的消息帧
//!
//! 与出站事件一致，线上格式为 `{"event": "<名称>", "data": <负载>}`。

use domain::MessageKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: Option<MessageKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Join(JoinRequest),
    Message(MessageRequest),
    Typing(bool),
    /// 显式离开，连接保持打开
    Leave,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("无法解析的消息帧: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("不支持二进制消息帧")]
    Binary,
}

impl FrameError {
    pub fn code(&self) -> &'static str {
        match self {
            FrameError::Malformed(_) => "BAD_FRAME",
            FrameError::Binary => "UNSUPPORTED_FRAME",
        }
    }
}

pub fn parse_frame(text: &str) -> Result<ClientEvent, FrameError> {
    Ok(serde_json::from_str(text)?)
}
