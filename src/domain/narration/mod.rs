//! Narration Context - 朗读上下文
//!
//! 朗读脚本构建、音色选择与播放会话状态

mod script;
mod session;
mod voice;

pub use script::{build_segments, NarrationMode, NarrationSegment, ScriptError, SpeakerRole};
pub use session::{
    clamp_rate, PlaybackSession, PlaybackState, PlaybackStatus, MAX_RATE, MIN_RATE,
};
pub use voice::{select_voice, GenderHint, VoicePreferences, VoiceProfile};
