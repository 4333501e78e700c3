//! 消息扇出引擎
//!
//! 接收单个会话的入站消息，盖上服务端ID与时间戳，再投递给所有已就绪会话。
//! 每次投递的接收者集合取自调用开始时的一次注册表快照；
//! 各接收者并发、独立投递，单个失败只记入报告，不中断其余投递。

use std::sync::Arc;
use std::time::Duration;

use config::RelayConfig;
use domain::{
    ChatMessage, ConnectionHandle, DeliveryFailureReason, DeliveryReport, MessageKind,
    ServerEvent, Session, SubmitError,
};
use futures::future::join_all;

use crate::clock::Clock;
use crate::dispatch::{Audience, Dispatch};
use crate::registry::ConnectionRegistry;
use crate::sequencer::MessageSequencer;
use crate::transport::Transport;

/// 扇出参数
#[derive(Debug, Clone)]
pub struct FanoutSettings {
    pub delivery_timeout: Duration,
    /// 0 表示不限制
    pub max_message_length: usize,
    pub echo_to_sender: bool,
}

impl Default for FanoutSettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for FanoutSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            delivery_timeout: config.delivery_timeout(),
            max_message_length: config.max_message_length,
            echo_to_sender: config.echo_to_sender,
        }
    }
}

pub struct FanoutEngine {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    sequencer: MessageSequencer,
    settings: FanoutSettings,
}

impl FanoutEngine {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        settings: FanoutSettings,
    ) -> Self {
        Self {
            registry,
            transport,
            clock,
            sequencer: MessageSequencer::new(),
            settings,
        }
    }

    /// 构造服务端盖章的消息
    ///
    /// 发送者必须是注册表中的存活会话；失败时注册表不受影响。
    pub async fn submit(
        &self,
        handle: &ConnectionHandle,
        text: impl Into<String>,
        kind: MessageKind,
    ) -> Result<ChatMessage, SubmitError> {
        let sender = self
            .registry
            .lookup(handle)
            .await
            .ok_or_else(|| SubmitError::UnknownSender(handle.clone()))?;

        let text = text.into();
        let max = self.settings.max_message_length;
        if max > 0 {
            let length = text.chars().count();
            if length > max {
                return Err(SubmitError::MessageTooLong { length, max });
            }
        }

        Ok(ChatMessage::new(
            self.sequencer.next_id(),
            text,
            &sender,
            self.clock.now(),
            kind,
        ))
    }

    /// 聊天消息的接收者范围
    pub fn message_audience(&self, message: &ChatMessage) -> Audience {
        if self.settings.echo_to_sender {
            Audience::Everyone
        } else {
            Audience::EveryoneExcept(message.sender_id().clone())
        }
    }

    /// 把消息投递给调用时刻的所有存活会话
    pub async fn broadcast(&self, message: &ChatMessage) -> DeliveryReport {
        let dispatch = Dispatch::new(self.message_audience(message), message.clone());
        let report = self.deliver(&dispatch).await;
        tracing::debug!(
            message_id = %message.id,
            sender_id = %message.sender_id(),
            attempted = report.attempted,
            failed = report.failed.len(),
            "消息扇出完成"
        );
        report
    }

    /// 按接收者范围投递任意出站事件
    pub async fn deliver(&self, dispatch: &Dispatch) -> DeliveryReport {
        let recipients = dispatch.audience.select(self.registry.members().await);
        self.deliver_to(recipients, &dispatch.event).await
    }

    async fn deliver_to(&self, recipients: Vec<Session>, event: &ServerEvent) -> DeliveryReport {
        let transport = self.transport.as_ref();
        let limit = self.settings.delivery_timeout;

        let attempts = recipients.into_iter().map(|session| async move {
            let handle = session.handle();
            let outcome = match tokio::time::timeout(limit, transport.send(&handle, event)).await
            {
                Ok(result) => result,
                Err(_) => Err(DeliveryFailureReason::TimedOut),
            };
            (session, outcome)
        });

        let mut report = DeliveryReport::default();
        for (session, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => report.record_success(session.id),
                Err(reason) => {
                    tracing::warn!(
                        session_id = %session.id,
                        event = event.name(),
                        reason = %reason,
                        "投递失败"
                    );
                    report.record_failure(session.id, reason);
                }
            }
        }
        report
    }
}
