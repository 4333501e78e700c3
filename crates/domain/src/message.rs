use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::value_objects::{MessageId, SessionId, Timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Typing,
}

/// 消息发送者的展示信息，创建消息时从会话复制。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: SessionId,
    pub name: String,
    pub avatar: String,
}

impl From<&Session> for MessageAuthor {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            avatar: session.avatar.clone(),
        }
    }
}

/// 服务端盖章后的聊天消息。只在投递期间存在，不落盘。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    #[serde(rename = "user")]
    pub sender: MessageAuthor,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        text: impl Into<String>,
        sender: &Session,
        timestamp: Timestamp,
        kind: MessageKind,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            sender: MessageAuthor::from(sender),
            timestamp,
            kind,
        }
    }

    pub fn sender_id(&self) -> &SessionId {
        &self.sender.id
    }
}
