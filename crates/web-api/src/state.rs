use std::sync::Arc;

use application::ChatRelay;
use config::AppConfig;
use infrastructure::ChannelTransport;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub transport: Arc<ChannelTransport>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 按配置组装传输层与聊天中继
    pub fn new(config: AppConfig) -> Self {
        let transport = Arc::new(ChannelTransport::from_config(&config.relay));
        let relay = Arc::new(ChatRelay::from_config(transport.clone(), &config.relay));
        Self {
            relay,
            transport,
            config: Arc::new(config),
        }
    }
}
