use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::value_objects::SessionId;

/// 会话加入、离开或输入状态变化的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceEvent {
    Joined(Session),
    Left {
        session_id: SessionId,
        name: String,
    },
    TypingChanged {
        session_id: SessionId,
        name: String,
        is_typing: bool,
    },
}

impl PresenceEvent {
    pub fn joined(session: Session) -> Self {
        PresenceEvent::Joined(session)
    }

    /// 离开事件携带会话最后的昵称，便于其他客户端展示
    pub fn left(session: &Session) -> Self {
        PresenceEvent::Left {
            session_id: session.id.clone(),
            name: session.name.clone(),
        }
    }

    pub fn typing(session: &Session, is_typing: bool) -> Self {
        PresenceEvent::TypingChanged {
            session_id: session.id.clone(),
            name: session.name.clone(),
            is_typing,
        }
    }
}
