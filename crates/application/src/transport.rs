use async_trait::async_trait;
use domain::{ConnectionHandle, DeliveryFailureReason, ServerEvent};

/// 传输层推送接口
///
/// 由外部传输层实现（WebSocket、进程内通道等）。实现必须是非阻塞或有界阻塞的：
/// 扇出引擎会为每个接收者并发调用，并对单次调用施加超时。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// 向单个连接推送事件
    async fn send(
        &self,
        handle: &ConnectionHandle,
        event: &ServerEvent,
    ) -> Result<(), DeliveryFailureReason>;
}
