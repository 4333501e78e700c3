use serde::{Deserialize, Serialize};

use crate::value_objects::{ConnectionHandle, SessionId};

/// 一个已加入、对他人可见的客户端在服务端的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub avatar: String,
}

impl Session {
    pub fn new(handle: &ConnectionHandle, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: SessionId::from(handle),
            name: name.into(),
            avatar: avatar.into(),
        }
    }

    pub fn handle(&self) -> ConnectionHandle {
        self.id.handle()
    }
}
