//! Web API 层。
//!
//! 提供 Axum 路由与 WebSocket 连接处理，把客户端事件委托给应用层的聊天中继。

mod error;
mod protocol;
mod routes;
mod state;
mod ws_connection;

pub use error::{ApiError, ErrorBody};
pub use protocol::{parse_frame, ClientEvent, FrameError, JoinRequest, MessageRequest};
pub use routes::router;
pub use state::AppState;
