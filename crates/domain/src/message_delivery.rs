use serde::{Deserialize, Serialize};

use crate::errors::DeliveryFailureReason;
use crate::value_objects::SessionId;

/// 单个接收者的投递失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub session_id: SessionId,
    pub reason: DeliveryFailureReason,
}

/// 一次扇出投递的结果汇总
/// 失败只用于观测，不影响消息本身的成功
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: Vec<SessionId>,
    pub failed: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn record_success(&mut self, session_id: SessionId) {
        self.attempted += 1;
        self.delivered.push(session_id);
    }

    pub fn record_failure(&mut self, session_id: SessionId, reason: DeliveryFailureReason) {
        self.attempted += 1;
        self.failed.push(DeliveryFailure { session_id, reason });
    }

    /// 所有接收者都已送达
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failed_sessions(&self) -> impl Iterator<Item = &SessionId> {
        self.failed.iter().map(|failure| &failure.session_id)
    }

    pub fn failure_for(&self, session_id: &SessionId) -> Option<&DeliveryFailureReason> {
        self.failed
            .iter()
            .find(|failure| &failure.session_id == session_id)
            .map(|failure| &failure.reason)
    }

    /// 合并另一份报告（例如加入时的广播与私发名单）
    pub fn merge(&mut self, other: DeliveryReport) {
        self.attempted += other.attempted;
        self.delivered.extend(other.delivered);
        self.failed.extend(other.failed);
    }
}
