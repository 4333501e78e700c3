use serde::{Deserialize, Serialize};

use crate::events::PresenceEvent;
use crate::message::ChatMessage;
use crate::session::Session;
use crate::value_objects::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: SessionId,
    pub user_name: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftNotice {
    pub id: SessionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
}

/// 推送给客户端的事件
///
/// 线上格式为 `{"event": "<名称>", "data": <负载>}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    UserJoined(Session),
    UsersList(Vec<Session>),
    NewMessage(ChatMessage),
    UserTyping(TypingNotice),
    UserLeft(LeftNotice),
    Error(ErrorNotice),
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorNotice {
            code: code.into(),
            message: message.into(),
        })
    }

    /// 事件名称，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::UserJoined(_) => "userJoined",
            ServerEvent::UsersList(_) => "usersList",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::UserTyping(_) => "userTyping",
            ServerEvent::UserLeft(_) => "userLeft",
            ServerEvent::Error(_) => "error",
        }
    }
}

impl From<PresenceEvent> for ServerEvent {
    fn from(event: PresenceEvent) -> Self {
        match event {
            PresenceEvent::Joined(session) => ServerEvent::UserJoined(session),
            PresenceEvent::Left { session_id, name } => {
                ServerEvent::UserLeft(LeftNotice { id: session_id, name })
            }
            PresenceEvent::TypingChanged {
                session_id,
                name,
                is_typing,
            } => ServerEvent::UserTyping(TypingNotice {
                user_id: session_id,
                user_name: name,
                is_typing,
            }),
        }
    }
}

impl From<ChatMessage> for ServerEvent {
    fn from(message: ChatMessage) -> Self {
        ServerEvent::NewMessage(message)
    }
}
