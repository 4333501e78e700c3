#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use config::AppConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, time::timeout};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 测试服务器，drop 时触发优雅关闭
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> WsClient {
        let (socket, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("connect websocket");
        socket
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(AppConfig::default()).await
}

pub async fn spawn_server_with(config: AppConfig) -> TestServer {
    let state = AppState::new(config);
    let app = router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestServer {
        addr,
        state,
        _shutdown: shutdown_tx,
    }
}

pub async fn send_event(socket: &mut WsClient, frame: Value) {
    socket
        .send(TungsteniteMessage::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// 读取下一个 JSON 事件，跳过心跳帧
pub async fn next_event(socket: &mut WsClient) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("websocket error");
        match message {
            TungsteniteMessage::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("event json");
            }
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// 读取事件直到遇到指定名称的事件
pub async fn expect_event(socket: &mut WsClient, name: &str) -> Value {
    loop {
        let event = next_event(socket).await;
        if event["event"] == name {
            return event;
        }
    }
}

/// 断言短时间内没有新事件
pub async fn assert_silent(socket: &mut WsClient) {
    let result = timeout(Duration::from_millis(200), socket.next()).await;
    assert!(result.is_err(), "unexpected event: {result:?}");
}
