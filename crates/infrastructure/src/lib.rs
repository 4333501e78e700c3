//! 基础设施层实现。
//!
//! 提供应用层 [`application::Transport`] 接口的进程内实现：
//! 每个连接一个有界出站队列，持续积压的连接会被驱逐。

pub mod channel_transport;

pub use channel_transport::ChannelTransport;
