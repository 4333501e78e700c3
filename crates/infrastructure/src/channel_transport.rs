//! 基于有界通道的进程内传输实现
//!
//! 每个连接挂载一个有界 `mpsc` 队列，由连接自己的写任务消费。
//! 推送使用 `try_send`，从不阻塞扇出；队列已满记为背压，
//! 连续背压达到阈值后关闭该连接的队列（驱逐），写任务随之退出。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use application::Transport;
use async_trait::async_trait;
use config::RelayConfig;
use domain::{ConnectionHandle, DeliveryFailureReason, ServerEvent};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 单个连接的出站队列
struct Outbound {
    sender: mpsc::Sender<ServerEvent>,
    /// 连续队列已满的次数
    lagged: Arc<AtomicU32>,
}

pub struct ChannelTransport {
    connections: RwLock<HashMap<ConnectionHandle, Outbound>>,
    capacity: usize,
    max_lagged: u32,
}

impl ChannelTransport {
    pub fn new(capacity: usize, max_lagged: u32) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            max_lagged: max_lagged.max(1),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.outbound_buffer, config.max_lagged_deliveries)
    }

    /// 为连接挂载出站队列，返回由连接写任务消费的接收端
    ///
    /// 同一句柄重复挂载时旧队列被替换并关闭。
    pub async fn attach(&self, handle: ConnectionHandle) -> mpsc::Receiver<ServerEvent> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let outbound = Outbound {
            sender,
            lagged: Arc::new(AtomicU32::new(0)),
        };
        let replaced = {
            let mut connections = self.connections.write().await;
            connections.insert(handle.clone(), outbound).is_some()
        };
        if replaced {
            warn!(handle = %handle, "出站队列被替换");
        }
        debug!(handle = %handle, capacity = self.capacity, "出站队列已挂载");
        receiver
    }

    /// 卸载连接的出站队列
    pub async fn detach(&self, handle: &ConnectionHandle) -> bool {
        let removed = self.connections.write().await.remove(handle).is_some();
        if removed {
            debug!(handle = %handle, "出站队列已卸载");
        }
        removed
    }

    pub async fn is_attached(&self, handle: &ConnectionHandle) -> bool {
        self.connections.read().await.contains_key(handle)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// 移除队列，仅当它仍是 `sender` 所在的那个队列
    async fn remove_if_same(&self, handle: &ConnectionHandle, sender: &mpsc::Sender<ServerEvent>) {
        let mut connections = self.connections.write().await;
        let is_same = connections
            .get(handle)
            .map(|outbound| outbound.sender.same_channel(sender))
            .unwrap_or(false);
        if is_same {
            connections.remove(handle);
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(
        &self,
        handle: &ConnectionHandle,
        event: &ServerEvent,
    ) -> Result<(), DeliveryFailureReason> {
        let (sender, lagged) = {
            let connections = self.connections.read().await;
            let outbound = connections
                .get(handle)
                .ok_or(DeliveryFailureReason::Disconnected)?;
            (outbound.sender.clone(), outbound.lagged.clone())
        };

        match sender.try_send(event.clone()) {
            Ok(()) => {
                lagged.store(0, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                let streak = lagged.fetch_add(1, Ordering::Relaxed) + 1;
                if streak >= self.max_lagged {
                    self.remove_if_same(handle, &sender).await;
                    warn!(
                        handle = %handle,
                        streak,
                        "连接持续积压，已驱逐"
                    );
                    Err(DeliveryFailureReason::Evicted)
                } else {
                    Err(DeliveryFailureReason::Backpressure)
                }
            }
            Err(TrySendError::Closed(_)) => {
                self.remove_if_same(handle, &sender).await;
                info!(handle = %handle, "出站队列已关闭");
                Err(DeliveryFailureReason::Disconnected)
            }
        }
    }
}
