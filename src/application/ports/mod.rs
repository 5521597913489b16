//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod catalog;
mod speech;

pub use catalog::{CatalogError, QuestionCatalogPort};
pub use speech::{
    SpeechError, SpeechEvent, SpeechEventKind, SpeechEventReceiver, SpeechEventSender,
    SpeechPort, UtteranceRequest,
};
