//! 连接注册表
//!
//! 跟踪所有存活会话及其在线信息。注册表是核心层唯一的共享可变状态：
//! 读操作共享读锁并行执行，注册/注销持写锁串行执行。
//!
//! 新注册的会话处于待就绪状态，在其私有名单投递之前不接收广播。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use config::RelayConfig;
use domain::{ConnectionHandle, RegistryError, RegistryResult, Session, SessionId};
use tokio::sync::{Mutex, RwLock};

/// 会话默认值：未提供昵称或头像时使用
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub avatar: String,
    pub name_prefix: String,
    pub name_length: usize,
}

impl SessionDefaults {
    fn name_for(&self, handle: &ConnectionHandle) -> String {
        format!("{} {}", self.name_prefix, handle.prefix(self.name_length))
    }
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for SessionDefaults {
    fn from(config: &RelayConfig) -> Self {
        Self {
            avatar: config.default_avatar.clone(),
            name_prefix: config.fallback_name_prefix.clone(),
            name_length: config.fallback_name_length,
        }
    }
}

/// 投递视角下的会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub session: Session,
    /// 已收到在线名单，可以接收广播
    pub ready: bool,
}

struct SessionEntry {
    session: Session,
    seq: u64,
    ready: bool,
    /// 发送通道：同一发送者的消息在此串行化，保证其先后顺序
    lane: Arc<Mutex<()>>,
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<SessionId, SessionEntry>,
    /// 注册序号 -> 会话，用于按注册顺序输出快照
    order: BTreeMap<u64, SessionId>,
    next_seq: u64,
}

/// 内存连接注册表
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
    defaults: SessionDefaults,
}

impl ConnectionRegistry {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            defaults,
        }
    }

    /// 为连接注册会话
    ///
    /// 昵称为空时由连接句柄前缀合成，头像为空时使用默认头像。
    pub async fn register(
        &self,
        handle: &ConnectionHandle,
        proposed_name: &str,
        proposed_avatar: &str,
    ) -> RegistryResult<Session> {
        // 仅含空白的昵称或头像按未提供处理
        let name = if proposed_name.trim().is_empty() {
            self.defaults.name_for(handle)
        } else {
            proposed_name.to_owned()
        };
        let avatar = if proposed_avatar.trim().is_empty() {
            self.defaults.avatar.clone()
        } else {
            proposed_avatar.to_owned()
        };
        let session = Session::new(handle, name, avatar);

        let mut state = self.state.write().await;
        if state.sessions.contains_key(&session.id) {
            return Err(RegistryError::DuplicateConnection(handle.clone()));
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, session.id.clone());
        state.sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                seq,
                ready: false,
                lane: Arc::new(Mutex::new(())),
            },
        );
        let online = state.sessions.len();
        drop(state);

        tracing::info!(
            session_id = %session.id,
            name = %session.name,
            online,
            "会话已注册"
        );
        Ok(session)
    }

    /// 注销连接对应的会话并返回它
    pub async fn unregister(&self, handle: &ConnectionHandle) -> RegistryResult<Session> {
        let id = SessionId::from(handle);
        let mut state = self.state.write().await;
        let entry = state
            .sessions
            .remove(&id)
            .ok_or_else(|| RegistryError::NotFound(handle.clone()))?;
        state.order.remove(&entry.seq);
        let online = state.sessions.len();
        drop(state);

        tracing::info!(
            session_id = %entry.session.id,
            name = %entry.session.name,
            online,
            "会话已注销"
        );
        Ok(entry.session)
    }

    /// 按注册顺序返回所有存活会话
    pub async fn snapshot(&self) -> Vec<Session> {
        let state = self.state.read().await;
        state
            .order
            .values()
            .filter_map(|id| state.sessions.get(id))
            .map(|entry| entry.session.clone())
            .collect()
    }

    /// 按注册顺序返回所有存活会话及其就绪状态
    pub async fn members(&self) -> Vec<Member> {
        let state = self.state.read().await;
        state
            .order
            .values()
            .filter_map(|id| state.sessions.get(id))
            .map(|entry| Member {
                session: entry.session.clone(),
                ready: entry.ready,
            })
            .collect()
    }

    /// 标记会话已收到在线名单；会话已不存在时返回 false
    pub async fn mark_ready(&self, handle: &ConnectionHandle) -> bool {
        let mut state = self.state.write().await;
        match state.sessions.get_mut(&SessionId::from(handle)) {
            Some(entry) => {
                entry.ready = true;
                true
            }
            None => false,
        }
    }

    pub async fn lookup(&self, handle: &ConnectionHandle) -> Option<Session> {
        let state = self.state.read().await;
        state
            .sessions
            .get(&SessionId::from(handle))
            .map(|entry| entry.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 获取发送者的串行通道
    pub(crate) async fn sender_lane(&self, handle: &ConnectionHandle) -> Option<Arc<Mutex<()>>> {
        let state = self.state.read().await;
        state
            .sessions
            .get(&SessionId::from(handle))
            .map(|entry| entry.lane.clone())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(SessionDefaults::default())
    }
}
