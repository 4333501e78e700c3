//! 聊天中继核心领域模型
//!
//! 包含会话、聊天消息、在线状态事件与投递报告，以及相关的错误类型。

pub mod errors;
pub mod events;
pub mod message;
pub mod message_delivery;
pub mod session;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use events::*;
pub use message::{ChatMessage, MessageAuthor, MessageKind};
pub use message_delivery::{DeliveryFailure, DeliveryReport};
pub use session::Session;
pub use value_objects::{ConnectionHandle, MessageId, SessionId, Timestamp};
