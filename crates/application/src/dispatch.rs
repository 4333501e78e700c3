use domain::{ServerEvent, Session, SessionId};

use crate::registry::Member;

/// 出站事件的接收者范围
///
/// 广播只覆盖已就绪的会话；待就绪会话只能被显式点名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// 所有已就绪会话
    Everyone,
    /// 所有已就绪会话，外加指定会话（无论是否就绪）
    EveryoneWith(SessionId),
    /// 除指定会话外的所有已就绪会话
    EveryoneExcept(SessionId),
    /// 仅指定会话
    Only(SessionId),
}

impl Audience {
    pub fn includes(&self, member: &Member) -> bool {
        let id = &member.session.id;
        match self {
            Audience::Everyone => member.ready,
            Audience::EveryoneWith(extra) => member.ready || extra == id,
            Audience::EveryoneExcept(excluded) => member.ready && excluded != id,
            Audience::Only(target) => target == id,
        }
    }

    /// 从注册表成员中筛选接收者，保持注册顺序
    pub fn select(&self, members: Vec<Member>) -> Vec<Session> {
        members
            .into_iter()
            .filter(|member| self.includes(member))
            .map(|member| member.session)
            .collect()
    }
}

/// 一条待投递的事件及其接收者范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Dispatch {
    pub fn new(audience: Audience, event: impl Into<ServerEvent>) -> Self {
        Self {
            audience,
            event: event.into(),
        }
    }
}
