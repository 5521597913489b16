//! Speech - 语音引擎适配器
//!
//! - espeak: espeak-ng 进程引擎
//! - scripted: 模拟引擎（测试与无声开发）

mod espeak;
mod scripted;

pub use espeak::{EspeakSpeechPort, EspeakSpeechPortConfig};
pub use scripted::{ScriptedSpeechPort, ScriptedSpeechPortConfig};
