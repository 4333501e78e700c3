//! 聊天中继门面
//!
//! 传输层唯一需要调用的入口：连接加入、离开、输入状态与消息发送。
//! 同一会话的事件在其发送通道上串行化，因此每个接收者看到的
//! 同一发送者的消息顺序与提交顺序一致；不同发送者之间互不等待。
//!
//! 加入与离开在在线状态闸门上串行执行：新会话的私有名单入队之后才
//! 标记就绪并开始接收广播，因此它在名单之前收到的加入事件都在名单中。

use std::sync::Arc;

use config::RelayConfig;
use domain::{
    ChatMessage, ConnectionHandle, DeliveryReport, MessageKind, Session, SubmitError,
};
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::dispatch::Dispatch;
use crate::error::ApplicationResult;
use crate::fanout::{FanoutEngine, FanoutSettings};
use crate::presence::PresenceNotifier;
use crate::registry::{ConnectionRegistry, SessionDefaults};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub session: Session,
    pub report: DeliveryReport,
}

#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub session: Session,
    pub report: DeliveryReport,
}

#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub message: ChatMessage,
    pub report: DeliveryReport,
}

pub struct ChatRelay {
    registry: Arc<ConnectionRegistry>,
    /// 串行化加入与离开
    presence_gate: Mutex<()>,
    notifier: PresenceNotifier,
    fanout: FanoutEngine,
}

impl ChatRelay {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        settings: FanoutSettings,
    ) -> Self {
        let fanout = FanoutEngine::new(registry.clone(), transport, clock, settings);
        Self {
            registry,
            presence_gate: Mutex::new(()),
            notifier: PresenceNotifier::new(),
            fanout,
        }
    }

    /// 按配置构建，使用系统时钟
    pub fn from_config(transport: Arc<dyn Transport>, config: &RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(SessionDefaults::from(config)));
        Self::new(
            registry,
            transport,
            Arc::new(SystemClock),
            FanoutSettings::from(config),
        )
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn fanout(&self) -> &FanoutEngine {
        &self.fanout
    }

    /// 连接加入：注册会话，通知所有人，并把当前名单私发给新会话
    ///
    /// 名单投递完成后会话才就绪，此前它不在任何广播的接收者之中。
    pub async fn join(
        &self,
        handle: &ConnectionHandle,
        name: &str,
        avatar: &str,
    ) -> ApplicationResult<JoinOutcome> {
        let _gate = self.presence_gate.lock().await;

        let session = self.registry.register(handle, name, avatar).await?;
        let roster = self.registry.snapshot().await;
        let dispatches = self.notifier.joined(&session, roster);

        let report = match self.registry.sender_lane(handle).await {
            Some(lane) => {
                let _guard = lane.lock().await;
                let report = self.deliver_all(&dispatches).await;
                self.registry.mark_ready(handle).await;
                report
            }
            None => DeliveryReport::default(),
        };

        Ok(JoinOutcome { session, report })
    }

    /// 连接离开：注销会话并通知剩余会话
    pub async fn leave(&self, handle: &ConnectionHandle) -> ApplicationResult<LeaveOutcome> {
        let _gate = self.presence_gate.lock().await;

        let session = self.registry.unregister(handle).await?;
        let report = self.deliver_all(&self.notifier.left(&session)).await;
        Ok(LeaveOutcome { session, report })
    }

    /// 输入状态变化，通知除本人外的所有会话
    pub async fn set_typing(
        &self,
        handle: &ConnectionHandle,
        is_typing: bool,
    ) -> ApplicationResult<DeliveryReport> {
        let lane = self
            .registry
            .sender_lane(handle)
            .await
            .ok_or_else(|| SubmitError::UnknownSender(handle.clone()))?;
        let _guard = lane.lock().await;

        let session = self
            .registry
            .lookup(handle)
            .await
            .ok_or_else(|| SubmitError::UnknownSender(handle.clone()))?;
        Ok(self
            .deliver_all(&self.notifier.typing(&session, is_typing))
            .await)
    }

    /// 提交并扇出一条消息
    ///
    /// 提交与扇出在发送者通道内作为一个整体执行。
    pub async fn send_message(
        &self,
        handle: &ConnectionHandle,
        text: impl Into<String>,
        kind: MessageKind,
    ) -> ApplicationResult<MessageOutcome> {
        let lane = self
            .registry
            .sender_lane(handle)
            .await
            .ok_or_else(|| SubmitError::UnknownSender(handle.clone()))?;
        let _guard = lane.lock().await;

        let message = self.fanout.submit(handle, text, kind).await?;
        let report = self.fanout.broadcast(&message).await;
        Ok(MessageOutcome { message, report })
    }

    /// 当前在线名单（注册顺序）
    pub async fn roster(&self) -> Vec<Session> {
        self.registry.snapshot().await
    }

    pub async fn lookup(&self, handle: &ConnectionHandle) -> Option<Session> {
        self.registry.lookup(handle).await
    }

    async fn deliver_all(&self, dispatches: &[Dispatch]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for dispatch in dispatches {
            report.merge(self.fanout.deliver(dispatch).await);
        }
        report
    }
}
