use std::ops::ControlFlow;

use application::{ApplicationError, Transport};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ConnectionHandle, RegistryError, ServerEvent};
use futures_util::{SinkExt, StreamExt};

use crate::protocol::{parse_frame, ClientEvent, FrameError};
use crate::state::AppState;

/// WebSocket 连接
///
/// 每个连接拥有一个 [`ConnectionHandle`] 和一个出站队列：
/// - 写任务把出站队列中的事件序列化后写入 socket
/// - 读循环解析客户端事件并调用聊天中继
/// - 任一侧结束后注销会话并卸载出站队列
pub struct WebSocketConnection {
    state: AppState,
    handle: ConnectionHandle,
}

impl WebSocketConnection {
    pub fn new(state: AppState) -> Self {
        let handle = ConnectionHandle::generate();
        tracing::info!(handle = %handle, "WebSocket 连接已建立");
        Self { state, handle }
    }

    pub async fn run(self, socket: WebSocket) {
        let mut outbound = self.state.transport.attach(self.handle.clone()).await;
        let (mut sender, mut incoming) = socket.split();

        let handle = self.handle.clone();
        let mut send_task = tokio::spawn(async move {
            loop {
                let Some(event) = outbound.recv().await else {
                    // 队列被关闭：连接被驱逐或已卸载
                    tracing::info!(handle = %handle, "出站队列已关闭，断开连接");
                    let _ = sender.send(WsMessage::Close(None)).await;
                    break;
                };
                let payload = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to serialize websocket payload");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    tracing::warn!(handle = %handle, "Failed to send text message");
                    break;
                }
            }
        });

        let recv_loop = async {
            while let Some(Ok(message)) = incoming.next().await {
                if self.handle_incoming(message).await.is_break() {
                    break;
                }
            }
        };

        tokio::select! {
            _ = &mut send_task => {
                tracing::debug!(handle = %self.handle, "WebSocket发送任务完成");
            }
            _ = recv_loop => {
                tracing::debug!(handle = %self.handle, "WebSocket接收任务完成");
            }
        }
        send_task.abort();

        self.cleanup().await;
    }

    async fn handle_incoming(&self, message: WsMessage) -> ControlFlow<()> {
        match message {
            WsMessage::Close(_) => {
                tracing::info!(handle = %self.handle, "WebSocket收到关闭消息");
                return ControlFlow::Break(());
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                tracing::debug!(handle = %self.handle, "收到心跳消息");
            }
            WsMessage::Text(text) => match parse_frame(text.as_str()) {
                Ok(event) => self.dispatch(event).await,
                Err(err) => self.reject_frame(err).await,
            },
            WsMessage::Binary(_) => self.reject_frame(FrameError::Binary).await,
        }
        ControlFlow::Continue(())
    }

    async fn dispatch(&self, event: ClientEvent) {
        let relay = &self.state.relay;
        let result = match event {
            ClientEvent::Join(request) => relay
                .join(
                    &self.handle,
                    request.name.as_deref().unwrap_or_default(),
                    request.avatar.as_deref().unwrap_or_default(),
                )
                .await
                .map(drop),
            ClientEvent::Message(request) => relay
                .send_message(&self.handle, request.text, request.kind.unwrap_or_default())
                .await
                .map(drop),
            ClientEvent::Typing(is_typing) => {
                relay.set_typing(&self.handle, is_typing).await.map(drop)
            }
            ClientEvent::Leave => relay.leave(&self.handle).await.map(drop),
        };

        if let Err(err) = result {
            tracing::warn!(handle = %self.handle, error = %err, "客户端请求被拒绝");
            self.reply_error(err.code(), err.to_string()).await;
        }
    }

    async fn reject_frame(&self, err: FrameError) {
        tracing::debug!(handle = %self.handle, error = %err, "消息帧解析失败");
        self.reply_error(err.code(), err.to_string()).await;
    }

    /// 错误只回复给当前连接，与其他出站事件共用同一队列以保持顺序
    async fn reply_error(&self, code: &str, message: String) {
        let event = ServerEvent::error(code, message);
        if let Err(reason) = self.state.transport.send(&self.handle, &event).await {
            tracing::debug!(handle = %self.handle, reason = %reason, "错误回复未送达");
        }
    }

    async fn cleanup(&self) {
        match self.state.relay.leave(&self.handle).await {
            Ok(outcome) => {
                tracing::info!(
                    handle = %self.handle,
                    name = %outcome.session.name,
                    "会话随连接关闭而注销"
                );
            }
            // 从未加入或已显式离开
            Err(ApplicationError::Registry(RegistryError::NotFound(_))) => {}
            Err(err) => {
                tracing::error!(handle = %self.handle, error = %err, "注销会话失败");
            }
        }
        self.state.transport.detach(&self.handle).await;
        tracing::info!(handle = %self.handle, "WebSocket连接已断开");
    }
}
