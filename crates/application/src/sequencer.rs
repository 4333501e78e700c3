use std::sync::atomic::{AtomicU64, Ordering};

use domain::MessageId;

/// 进程内消息序列器
/// 原子递增分配消息ID，并发提交下也保证唯一且严格递增
#[derive(Debug)]
pub struct MessageSequencer {
    next: AtomicU64,
}

impl MessageSequencer {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// 分配下一个消息ID
    pub fn next_id(&self) -> MessageId {
        MessageId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MessageSequencer {
    fn default() -> Self {
        Self::new()
    }
}
