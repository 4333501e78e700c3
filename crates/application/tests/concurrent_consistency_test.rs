//! 并发一致性测试
//!
//! 验证高并发下注册表快照、在线名单一致性、消息ID唯一性与单发送者消息顺序

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use application::{ChatRelay, Transport};
use async_trait::async_trait;
use config::RelayConfig;
use domain::{ConnectionHandle, DeliveryFailureReason, MessageKind, ServerEvent, SessionId};
use tokio::sync::{Notify, Semaphore};
use tokio::time::sleep;

/// 记录每个连接收到的事件
#[derive(Default)]
struct RecordingTransport {
    inbox: Mutex<HashMap<ConnectionHandle, Vec<ServerEvent>>>,
}

impl RecordingTransport {
    fn events_for(&self, recipient: &str) -> Vec<ServerEvent> {
        self.inbox
            .lock()
            .unwrap()
            .get(&ConnectionHandle::new(recipient))
            .cloned()
            .unwrap_or_default()
    }

    /// 某连接收到的、来自指定发送者的消息文本（按到达顺序）
    fn texts_from(&self, recipient: &str, sender: &str) -> Vec<String> {
        let inbox = self.inbox.lock().unwrap();
        inbox
            .get(&ConnectionHandle::new(recipient))
            .map(|events| {
                events
                    .iter()
                    .filter_map(|event| match event {
                        ServerEvent::NewMessage(message)
                            if message.sender_id().as_str() == sender =>
                        {
                            Some(message.text.clone())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn message_ids_from(&self, recipient: &str, sender: &str) -> Vec<u64> {
        let inbox = self.inbox.lock().unwrap();
        inbox
            .get(&ConnectionHandle::new(recipient))
            .map(|events| {
                events
                    .iter()
                    .filter_map(|event| match event {
                        ServerEvent::NewMessage(message)
                            if message.sender_id().as_str() == sender =>
                        {
                            Some(message.id.value())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        handle: &ConnectionHandle,
        event: &ServerEvent,
    ) -> Result<(), DeliveryFailureReason> {
        // 模拟不均匀的网络延迟，放大交错
        let jitter = (handle.as_str().len() as u64 % 3) * 2;
        sleep(Duration::from_millis(jitter)).await;
        self.inbox
            .lock()
            .unwrap()
            .entry(handle.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }
}

/// 扣住发给指定连接的第一个事件，直到测试放行
struct GatedTransport {
    inner: RecordingTransport,
    held: ConnectionHandle,
    armed: AtomicBool,
    blocked: Notify,
    release: Semaphore,
}

impl GatedTransport {
    fn holding(handle: &str) -> Self {
        Self {
            inner: RecordingTransport::default(),
            held: ConnectionHandle::new(handle),
            armed: AtomicBool::new(true),
            blocked: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(
        &self,
        handle: &ConnectionHandle,
        event: &ServerEvent,
    ) -> Result<(), DeliveryFailureReason> {
        if *handle == self.held && self.armed.swap(false, Ordering::SeqCst) {
            self.blocked.notify_one();
            self.release
                .acquire()
                .await
                .map_err(|err| DeliveryFailureReason::transport(err.to_string()))?
                .forget();
        }
        self.inner.send(handle, event).await
    }
}

/// 校验一个会话收到的在线事件序列，返回它最终认为在线的会话
///
/// 在名单之前收到的每个加入事件，其会话都必须出现在名单中。
fn known_sessions(recipient: &str, events: &[ServerEvent]) -> HashSet<SessionId> {
    let list_at = events
        .iter()
        .position(|event| matches!(event, ServerEvent::UsersList(_)))
        .unwrap_or_else(|| panic!("{recipient} never received usersList"));
    let ServerEvent::UsersList(roster) = &events[list_at] else {
        unreachable!()
    };
    let mut known: HashSet<SessionId> = roster.iter().map(|s| s.id.clone()).collect();

    for event in &events[..list_at] {
        if let ServerEvent::UserJoined(session) = event {
            assert!(
                known.contains(&session.id),
                "{recipient} saw userJoined({}) before a roster that omits it",
                session.id
            );
        }
    }
    for event in &events[list_at + 1..] {
        match event {
            ServerEvent::UserJoined(session) => {
                known.insert(session.id.clone());
            }
            ServerEvent::UserLeft(notice) => {
                known.remove(&notice.id);
            }
            _ => {}
        }
    }
    known
}

fn build_relay() -> (Arc<ChatRelay>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let relay = Arc::new(ChatRelay::from_config(
        transport.clone(),
        &RelayConfig::default(),
    ));
    (relay, transport)
}

/// 测试并发加入/离开后快照与实际存活会话一致
#[tokio::test]
async fn test_concurrent_join_leave_consistency() {
    let (relay, _transport) = build_relay();
    let handles: Vec<ConnectionHandle> = (0..20)
        .map(|i| ConnectionHandle::new(format!("conn-{i:02}")))
        .collect();

    let join_tasks: Vec<_> = handles
        .iter()
        .cloned()
        .map(|handle| {
            let relay = relay.clone();
            tokio::spawn(async move { relay.join(&handle, "", "").await })
        })
        .collect();

    let join_results: Vec<_> = futures::future::join_all(join_tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert!(join_results.iter().all(|result| result.is_ok()));
    assert_eq!(relay.roster().await.len(), handles.len());

    // 并发移除偶数编号的连接
    let leave_tasks: Vec<_> = handles
        .iter()
        .step_by(2)
        .cloned()
        .map(|handle| {
            let relay = relay.clone();
            tokio::spawn(async move { relay.leave(&handle).await })
        })
        .collect();
    for result in futures::future::join_all(leave_tasks).await {
        assert!(result.unwrap().is_ok());
    }

    let remaining: HashSet<SessionId> = relay
        .roster()
        .await
        .into_iter()
        .map(|session| session.id)
        .collect();
    let expected: HashSet<SessionId> = handles
        .iter()
        .skip(1)
        .step_by(2)
        .map(SessionId::from)
        .collect();
    assert_eq!(remaining, expected);
}

/// 测试快照顺序等于注册顺序
#[tokio::test]
async fn test_snapshot_keeps_registration_order() {
    let (relay, _transport) = build_relay();
    let names = ["Alice", "Bob", "Carol", "Dave"];
    for (i, name) in names.iter().enumerate() {
        relay
            .join(&ConnectionHandle::new(format!("h{i}")), name, "")
            .await
            .unwrap();
    }
    relay.leave(&ConnectionHandle::new("h1")).await.unwrap();

    let roster: Vec<String> = relay.roster().await.into_iter().map(|s| s.name).collect();
    assert_eq!(roster, vec!["Alice", "Carol", "Dave"]);
}

/// 测试单个发送者的消息顺序在每个接收者处保持不变
#[tokio::test]
async fn test_single_sender_order_is_preserved() {
    let (relay, transport) = build_relay();
    for handle in ["a", "bb", "ccc"] {
        relay
            .join(&ConnectionHandle::new(handle), handle, "")
            .await
            .unwrap();
    }

    let sender_a = {
        let relay = relay.clone();
        tokio::spawn(async move {
            let handle = ConnectionHandle::new("a");
            for i in 0..25 {
                relay
                    .send_message(&handle, format!("m{i}"), MessageKind::Text)
                    .await
                    .unwrap();
            }
        })
    };
    let sender_b = {
        let relay = relay.clone();
        tokio::spawn(async move {
            let handle = ConnectionHandle::new("bb");
            for i in 0..25 {
                relay
                    .send_message(&handle, format!("n{i}"), MessageKind::Text)
                    .await
                    .unwrap();
            }
        })
    };
    sender_a.await.unwrap();
    sender_b.await.unwrap();

    let expected_a: Vec<String> = (0..25).map(|i| format!("m{i}")).collect();
    let expected_b: Vec<String> = (0..25).map(|i| format!("n{i}")).collect();
    for recipient in ["a", "bb", "ccc"] {
        assert_eq!(transport.texts_from(recipient, "a"), expected_a);
        assert_eq!(transport.texts_from(recipient, "bb"), expected_b);
    }
}

/// 测试同一发送者的并发提交：接收顺序与ID顺序一致，且ID不重复
#[tokio::test]
async fn test_concurrent_submissions_from_one_sender() {
    let (relay, transport) = build_relay();
    for handle in ["a", "bb"] {
        relay
            .join(&ConnectionHandle::new(handle), handle, "")
            .await
            .unwrap();
    }

    let tasks: Vec<_> = (0..30)
        .map(|i| {
            let relay = relay.clone();
            let sender = if i % 3 == 0 { "bb" } else { "a" };
            tokio::spawn(async move {
                relay
                    .send_message(&ConnectionHandle::new(sender), format!("x{i}"), MessageKind::Text)
                    .await
                    .map(|outcome| outcome.message.id)
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for result in futures::future::join_all(tasks).await {
        let id = result.unwrap().unwrap();
        assert!(ids.insert(id), "duplicate message id {id}");
    }
    assert_eq!(ids.len(), 30);

    for recipient in ["a", "bb"] {
        for sender in ["a", "bb"] {
            let received = transport.message_ids_from(recipient, sender);
            assert!(
                received.windows(2).all(|pair| pair[0] < pair[1]),
                "{recipient} saw {sender}'s messages out of order: {received:?}"
            );
        }
    }
}

/// 测试新会话的名单在途时另一个会话加入：名单不会漏掉已通知的会话
#[tokio::test]
async fn test_join_during_pending_roster_stays_consistent() {
    let transport = Arc::new(GatedTransport::holding("A"));
    let relay = Arc::new(ChatRelay::from_config(
        transport.clone(),
        &RelayConfig::default(),
    ));

    let join_a = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.join(&ConnectionHandle::new("A"), "A", "").await })
    };
    // A 自己的 userJoined 被扣住时，B 开始加入
    transport.blocked.notified().await;
    let join_b = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.join(&ConnectionHandle::new("B"), "B", "").await })
    };
    sleep(Duration::from_millis(50)).await;
    transport.release.add_permits(1);

    join_a.await.unwrap().unwrap();
    join_b.await.unwrap().unwrap();

    let live: HashSet<SessionId> = relay.roster().await.into_iter().map(|s| s.id).collect();
    for recipient in ["A", "B"] {
        let events = transport.inner.events_for(recipient);
        assert_eq!(known_sessions(recipient, &events), live, "{recipient}: {events:?}");
    }
}

/// 测试大量并发加入后，每个会话对在线名单的认知都与注册表一致
#[tokio::test]
async fn test_concurrent_joins_keep_rosters_consistent() {
    let (relay, transport) = build_relay();
    // 句柄长度不同，传输延迟随之不同
    let handles: Vec<String> = (0..16)
        .map(|i| format!("{}{i:02}", "j".repeat(1 + i % 3)))
        .collect();

    let tasks: Vec<_> = handles
        .iter()
        .cloned()
        .map(|handle| {
            let relay = relay.clone();
            tokio::spawn(async move { relay.join(&ConnectionHandle::new(handle), "", "").await })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().is_ok());
    }

    // 部分会话并发离开
    let leaving: HashSet<String> = handles.iter().step_by(3).cloned().collect();
    let leaves: Vec<_> = leaving
        .iter()
        .cloned()
        .map(|handle| {
            let relay = relay.clone();
            tokio::spawn(async move { relay.leave(&ConnectionHandle::new(handle)).await })
        })
        .collect();
    for result in futures::future::join_all(leaves).await {
        assert!(result.unwrap().is_ok());
    }

    let live: HashSet<SessionId> = relay.roster().await.into_iter().map(|s| s.id).collect();
    assert_eq!(live.len(), handles.len() - leaving.len());
    for handle in handles.iter().filter(|h| !leaving.contains(*h)) {
        let events = transport.events_for(handle);
        assert_eq!(known_sessions(handle, &events), live, "{handle}: {events:?}");
    }
}
