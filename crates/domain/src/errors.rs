//! 领域模型错误定义
//!
//! 注册表、消息提交与投递三类错误。前两类返回给调用方，
//! 投递失败只收集进报告，不向发送者传播。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::ConnectionHandle;

/// 连接注册表错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 该连接已有存活会话
    #[error("连接已注册: {0}")]
    DuplicateConnection(ConnectionHandle),

    /// 该连接没有存活会话
    #[error("连接未注册: {0}")]
    NotFound(ConnectionHandle),
}

/// 消息提交错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// 发送者不在注册表中（未加入或已断开）
    #[error("未知发送者: {0}")]
    UnknownSender(ConnectionHandle),

    /// 消息内容超过长度上限
    #[error("消息内容过长: {length} > {max}")]
    MessageTooLong { length: usize, max: usize },
}

/// 单个接收者的投递失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeliveryFailureReason {
    /// 连接已断开或从未挂载
    #[error("连接已断开")]
    Disconnected,

    /// 出站队列已满
    #[error("出站队列已满")]
    Backpressure,

    /// 连接因持续积压被驱逐
    #[error("连接因持续积压被驱逐")]
    Evicted,

    /// 投递超时
    #[error("投递超时")]
    TimedOut,

    /// 其他传输层错误
    #[error("传输错误: {0}")]
    Transport(String),
}

impl DeliveryFailureReason {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// 注册表结果类型
pub type RegistryResult<T> = Result<T, RegistryError>;
