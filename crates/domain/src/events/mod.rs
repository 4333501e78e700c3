//! 出站事件定义
//!
//! 在线状态事件由注册表变更推导而来，最终与聊天消息一起
//! 封装为统一的服务端事件写回传输层。

pub mod presence_event;
pub mod server_event;

pub use presence_event::PresenceEvent;
pub use server_event::{ErrorNotice, LeftNotice, ServerEvent, TypingNotice};
