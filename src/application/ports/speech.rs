//! Speech Port - 语音合成能力抽象
//!
//! 定义外部 TTS 能力的抽象接口，具体实现在 infrastructure/speech 层。
//!
//! 事件模型: 适配器在构造时拿到一个 mpsc Sender，`speak` 提交后异步回报
//! Started / WordBoundary / Finished / Failed 事件，每个事件携带提交时
//! 请求里的序列号。控制器据此丢弃已取消 utterance 的过期事件。

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::narration::VoiceProfile;

/// 语音能力错误
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// 语音能力完全不可用（致命，会话进入 Failed）
    #[error("Speech capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// 单次发声失败（非致命，按片段结束处理以保证前进）
    #[error("Utterance failure: {0}")]
    UtteranceFailure(String),
}

impl SpeechError {
    /// 是否为致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_))
    }
}

/// 一次发声请求
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    /// 单调递增的序列号，控制器用于识别过期回调
    pub seq: u64,
    /// 要朗读的文本
    pub text: String,
    /// 音色句柄；None 表示使用引擎默认音色
    pub voice: Option<String>,
    /// 语速 (0.5 - 2.0)
    pub rate: f32,
    /// 音调
    pub pitch: f32,
}

/// 语音事件内容
#[derive(Debug, Clone)]
pub enum SpeechEventKind {
    /// utterance 开始发声
    Started,
    /// 单词边界，char_offset 为该词在文本中的字符起始位置
    WordBoundary { char_offset: usize },
    /// utterance 正常完成
    Finished,
    /// utterance 出错
    Failed { error: SpeechError },
}

/// 语音事件，seq 对应提交时的 UtteranceRequest.seq
#[derive(Debug, Clone)]
pub struct SpeechEvent {
    pub seq: u64,
    pub kind: SpeechEventKind,
}

/// 事件发送端类型别名（适配器持有）
pub type SpeechEventSender = mpsc::UnboundedSender<SpeechEvent>;

/// 事件接收端类型别名（控制器持有）
pub type SpeechEventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

/// Speech Port
///
/// 控制器对外部语音能力的全部要求。方法本身同步返回，发声进度
/// 通过事件通道异步回报。
pub trait SpeechPort: Send + Sync {
    /// 提交一次发声
    ///
    /// 调用方保证提交前已 cancel 任何在途 utterance
    fn speak(&self, request: UtteranceRequest) -> Result<(), SpeechError>;

    /// 取消任何在途 utterance
    ///
    /// 同步生效；被取消 utterance 的后续事件由控制器按过期序列号丢弃
    fn cancel(&self);

    /// 尽力挂起当前 utterance
    ///
    /// 返回 true 表示引擎真正挂起了发声；返回 false 时调用方需
    /// 退化为 cancel + 按 word boundary 偏移重建文本再提交
    fn pause(&self) -> bool;

    /// 尽力恢复被挂起的 utterance，语义同 `pause`
    fn resume(&self) -> bool;

    /// 查询当前可用音色
    ///
    /// 引擎可能异步加载音色，每次发声前都应重新查询
    fn list_voices(&self) -> Vec<VoiceProfile>;
}
