//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechPort、QuestionCatalogPort）
//! - playback: 播放控制器与传输命令
//! - error: 应用层错误定义

pub mod error;
pub mod playback;
pub mod ports;

pub use error::ApplicationError;
pub use playback::{PlaybackController, PlaybackHandle, PlaybackSettings, TransportCommand};
pub use ports::{
    CatalogError, QuestionCatalogPort, SpeechError, SpeechEvent, SpeechEventKind,
    SpeechEventReceiver, SpeechEventSender, SpeechPort, UtteranceRequest,
};
