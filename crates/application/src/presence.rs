//! 在线状态通知
//!
//! 把注册表的状态迁移翻译成出站事件，并为每种事件指定接收者范围：
//! - 加入：`userJoined` 发给所有人（包括新会话），名单只私发给新会话
//! - 离开：`userLeft` 发给剩余的所有人
//! - 输入状态：`userTyping` 发给除本人外的所有人

use domain::{PresenceEvent, ServerEvent, Session};

use crate::dispatch::{Audience, Dispatch};

/// 无状态的在线事件翻译器
#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceNotifier;

impl PresenceNotifier {
    pub fn new() -> Self {
        Self
    }

    /// 会话加入后的事件，`roster` 为加入后的注册表快照
    pub fn joined(&self, session: &Session, roster: Vec<Session>) -> Vec<Dispatch> {
        vec![
            Dispatch::new(
                Audience::EveryoneWith(session.id.clone()),
                PresenceEvent::joined(session.clone()),
            ),
            Dispatch::new(
                Audience::Only(session.id.clone()),
                ServerEvent::UsersList(roster),
            ),
        ]
    }

    /// 会话离开后的事件；离开的会话已不在注册表中，不会收到
    pub fn left(&self, session: &Session) -> Vec<Dispatch> {
        vec![Dispatch::new(Audience::Everyone, PresenceEvent::left(session))]
    }

    pub fn typing(&self, session: &Session, is_typing: bool) -> Vec<Dispatch> {
        vec![Dispatch::new(
            Audience::EveryoneExcept(session.id.clone()),
            PresenceEvent::typing(session, is_typing),
        )]
    }
}
