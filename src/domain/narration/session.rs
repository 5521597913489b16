//! 播放会话状态机记录
//!
//! 单一可变状态记录，由播放控制器独占持有。UI 只读快照
//! (`PlaybackStatus`)，从不直接修改会话。
//!
//! 不变量:
//! - 非 Idle 状态下 question_index 始终落在 [0, questions.len())
//! - segment_index 始终落在当前题目按当前模式展开的片段范围内
//! - 全会话任意时刻至多一个在途 utterance（由控制器的序列号保证）

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::question::{Question, Topic};
use super::script::{NarrationMode, NarrationSegment, SpeakerRole};

/// 语速范围
pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

/// 会话生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// 未加载题目
    Idle,
    /// 题目已加载，未在朗读
    Ready,
    /// 一个 utterance 在途
    Speaking,
    /// utterance 已挂起，可恢复
    Paused,
    /// 最后一题最后一个片段完成，自动推进耗尽
    Finished,
    /// 不可恢复的能力错误
    Failed,
}

/// 播放会话
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: String,
    pub state: PlaybackState,
    pub topic: Option<Topic>,
    pub questions: Vec<Question>,
    /// 当前题目下标（0 起始）
    pub question_index: usize,
    /// 当前片段下标
    pub segment_index: usize,
    /// 当前题目按当前模式展开的片段
    pub segments: Vec<NarrationSegment>,
    pub mode: NarrationMode,
    pub rate: f32,
    pub pitch: f32,
    pub auto_advance: bool,
    /// 暂停恢复用的字符偏移（最近一次 word boundary），每个新片段开始时清零
    pub resume_offset: usize,
    pub created_at: DateTime<Utc>,
}

impl PlaybackSession {
    pub fn new(mode: NarrationMode, rate: f32, pitch: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: PlaybackState::Idle,
            topic: None,
            questions: Vec::new(),
            question_index: 0,
            segment_index: 0,
            segments: Vec::new(),
            mode,
            rate: clamp_rate(rate),
            pitch,
            auto_advance: true,
            resume_offset: 0,
            created_at: Utc::now(),
        }
    }

    /// 装载题目，进入 Ready
    pub fn load(&mut self, topic: Topic, questions: Vec<Question>) {
        self.topic = Some(topic);
        self.questions = questions;
        self.question_index = 0;
        self.segment_index = 0;
        self.segments.clear();
        self.resume_offset = 0;
        self.state = PlaybackState::Ready;
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }

    pub fn current_segment(&self) -> Option<&NarrationSegment> {
        self.segments.get(self.segment_index)
    }

    pub fn current_role(&self) -> Option<SpeakerRole> {
        self.current_segment().map(|s| s.role)
    }

    /// 当前是否还有下一个片段
    pub fn has_next_segment(&self) -> bool {
        self.segment_index + 1 < self.segments.len()
    }

    /// 当前是否还有下一题
    pub fn has_next_question(&self) -> bool {
        self.question_index + 1 < self.questions.len()
    }

    /// 生成只读快照
    pub fn snapshot(&self) -> PlaybackStatus {
        PlaybackStatus {
            session_id: self.id.clone(),
            state: self.state,
            topic_name: self.topic.as_ref().map(|t| t.name.clone()),
            question_index: self.question_index,
            question_count: self.question_count(),
            segment_role: self.current_role(),
            mode: self.mode,
            rate: self.rate,
            auto_advance: self.auto_advance,
        }
    }
}

/// 语速钳制到合法区间
pub fn clamp_rate(rate: f32) -> f32 {
    rate.clamp(MIN_RATE, MAX_RATE)
}

/// 会话只读快照，供 UI 轮询或订阅
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub session_id: String,
    pub state: PlaybackState,
    pub topic_name: Option<String>,
    pub question_index: usize,
    pub question_count: usize,
    pub segment_role: Option<SpeakerRole>,
    pub mode: NarrationMode,
    pub rate: f32,
    pub auto_advance: bool,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            state: PlaybackState::Idle,
            topic_name: None,
            question_index: 0,
            question_count: 0,
            segment_role: None,
            mode: NarrationMode::Full,
            rate: 1.0,
            auto_advance: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_topic() -> Topic {
        Topic {
            id: "t1".to_string(),
            name: "Legislación".to_string(),
            short_name: "LEG".to_string(),
        }
    }

    fn sample_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{}", i),
                question_text: format!("Q{}", i),
                options: vec!["a".to_string(), "b".to_string()],
                correct_option: "a".to_string(),
                tips: None,
            })
            .collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = PlaybackSession::new(NarrationMode::Full, 0.9, 1.0);
        assert_eq!(session.state, PlaybackState::Idle);
        assert_eq!(session.question_count(), 0);
    }

    #[test]
    fn test_load_enters_ready() {
        let mut session = PlaybackSession::new(NarrationMode::Full, 0.9, 1.0);
        session.load(sample_topic(), sample_questions(3));
        assert_eq!(session.state, PlaybackState::Ready);
        assert_eq!(session.question_count(), 3);
        assert_eq!(session.question_index, 0);
    }

    #[test]
    fn test_rate_clamped_on_creation() {
        let session = PlaybackSession::new(NarrationMode::Full, 5.0, 1.0);
        assert!((session.rate - MAX_RATE).abs() < f32::EPSILON);
        let session = PlaybackSession::new(NarrationMode::Full, 0.1, 1.0);
        assert!((session.rate - MIN_RATE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_snapshot_reflects_session() {
        let mut session = PlaybackSession::new(NarrationMode::CorrectOnly, 1.0, 1.0);
        session.load(sample_topic(), sample_questions(2));
        let status = session.snapshot();
        assert_eq!(status.state, PlaybackState::Ready);
        assert_eq!(status.question_count, 2);
        assert_eq!(status.topic_name.as_deref(), Some("Legislación"));
        assert_eq!(status.mode, NarrationMode::CorrectOnly);
    }
}
