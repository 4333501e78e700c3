//! 应用层实现。
//!
//! 连接注册表、在线状态通知与消息扇出引擎，以及把三者组合起来的中继门面。
//! 核心层不包含任何网络代码，对外只依赖 [`Transport`] 推送接口。

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod presence;
pub mod registry;
pub mod relay;
pub mod sequencer;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use dispatch::{Audience, Dispatch};
pub use error::{ApplicationError, ApplicationResult};
pub use fanout::{FanoutEngine, FanoutSettings};
pub use presence::PresenceNotifier;
pub use registry::{ConnectionRegistry, Member, SessionDefaults};
pub use relay::{ChatRelay, JoinOutcome, LeaveOutcome, MessageOutcome};
pub use sequencer::MessageSequencer;
pub use transport::Transport;
