//! 播放控制器
//!
//! 状态机本体：一个 tokio 任务独占持有 `PlaybackSession`，在单一
//! select 循环中消费传输命令与语音事件，事件处理运行至完成后才取
//! 下一个事件，因此控制器内部不存在并行执行。
//!
//! 排序保证: 控制器任意时刻至多一个在途 utterance。每次提交前先
//! cancel，并为新 utterance 分配单调递增序列号；序列号不匹配的回
//! 调事件一律丢弃，被取消 utterance 的迟到回调因此天然失效。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    SpeechEvent, SpeechEventKind, SpeechEventReceiver, SpeechPort, UtteranceRequest,
};
use crate::config::NarrationConfig;
use crate::domain::narration::{
    build_segments, clamp_rate, select_voice, NarrationMode, PlaybackSession, PlaybackState,
    PlaybackStatus, VoicePreferences,
};
use crate::domain::question::{Question, Topic};

use super::command::{CommandReply, TransportCommand};

/// 控制器启动参数
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    pub mode: NarrationMode,
    pub rate: f32,
    pub pitch: f32,
    /// 自动推进时的题间停顿
    pub gap: Duration,
    pub preferences: VoicePreferences,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            mode: NarrationMode::Full,
            rate: 0.9,
            pitch: 1.0,
            gap: Duration::from_millis(1000),
            preferences: VoicePreferences::default(),
        }
    }
}

impl PlaybackSettings {
    /// 从朗读配置构建
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self {
            mode: NarrationMode::Full,
            rate: config.rate,
            pitch: config.pitch,
            gap: Duration::from_millis(config.gap_ms),
            preferences: VoicePreferences {
                language: config.language.clone(),
                narrator_voices: config.narrator_voices.clone(),
                reader_voices: config.reader_voices.clone(),
            },
        }
    }
}

/// 播放控制句柄
///
/// 可克隆的命令/状态门面，HTTP 层与 WebSocket 层共用
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<TransportCommand>,
    status: watch::Receiver<PlaybackStatus>,
}

impl PlaybackHandle {
    async fn send(
        &self,
        make: impl FnOnce(CommandReply) -> TransportCommand,
    ) -> Result<PlaybackStatus, ApplicationError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.commands
            .send(make(tx))
            .map_err(|_| ApplicationError::internal("Playback controller stopped"))?;
        rx.await
            .map_err(|_| ApplicationError::internal("Playback controller dropped the command"))?
    }

    pub async fn load(
        &self,
        topic: Topic,
        questions: Vec<Question>,
    ) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Load {
            topic,
            questions,
            reply,
        })
        .await
    }

    pub async fn play(&self, start_number: usize) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Play {
            start_number,
            reply,
        })
        .await
    }

    pub async fn pause(&self) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Resume { reply }).await
    }

    pub async fn stop(&self) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Stop { reply }).await
    }

    pub async fn next(&self) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Next { reply }).await
    }

    pub async fn previous(&self) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::Previous { reply }).await
    }

    pub async fn jump_to(
        &self,
        question_number: usize,
    ) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::JumpTo {
            question_number,
            reply,
        })
        .await
    }

    pub async fn set_mode(&self, mode: NarrationMode) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::SetMode { mode, reply })
            .await
    }

    pub async fn set_rate(&self, rate: f32) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::SetRate { rate, reply })
            .await
    }

    pub async fn set_auto_advance(
        &self,
        enabled: bool,
    ) -> Result<PlaybackStatus, ApplicationError> {
        self.send(|reply| TransportCommand::SetAutoAdvance { enabled, reply })
            .await
    }

    /// 当前会话快照
    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// 订阅状态变更（WebSocket 推送用）
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }
}

/// 播放控制器
pub struct PlaybackController {
    session: PlaybackSession,
    port: Arc<dyn SpeechPort>,
    commands: mpsc::UnboundedReceiver<TransportCommand>,
    events: SpeechEventReceiver,
    status_tx: watch::Sender<PlaybackStatus>,
    preferences: VoicePreferences,
    gap: Duration,

    /// 当前 utterance 序列号
    seq: u64,
    /// 是否有 utterance 在途（已提交且未完成/未取消）
    in_flight: bool,
    /// 暂停是否通过引擎真实挂起实现
    suspended: bool,
    /// 自动推进的题间停顿截止时刻
    gap_deadline: Option<Instant>,
    /// 本次提交的文本在片段原文中的字符起点（续播重建用）
    segment_base: usize,
}

impl PlaybackController {
    /// 创建控制器与句柄
    pub fn new(
        port: Arc<dyn SpeechPort>,
        events: SpeechEventReceiver,
        settings: PlaybackSettings,
    ) -> (Self, PlaybackHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let session = PlaybackSession::new(settings.mode, settings.rate, settings.pitch);
        let (status_tx, status_rx) = watch::channel(session.snapshot());

        let controller = Self {
            session,
            port,
            commands: cmd_rx,
            events,
            status_tx,
            preferences: settings.preferences,
            gap: settings.gap,
            seq: 0,
            in_flight: false,
            suspended: false,
            gap_deadline: None,
            segment_base: 0,
        };
        let handle = PlaybackHandle {
            commands: cmd_tx,
            status: status_rx,
        };
        (controller, handle)
    }

    /// 启动控制器任务，返回句柄
    pub fn spawn(
        port: Arc<dyn SpeechPort>,
        events: SpeechEventReceiver,
        settings: PlaybackSettings,
    ) -> PlaybackHandle {
        let (controller, handle) = Self::new(port, events, settings);
        tokio::spawn(controller.run());
        handle
    }

    /// 控制器主循环
    ///
    /// 挂起点只有三处: 命令通道、语音事件通道、题间停顿截止时刻
    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session.id, "Playback controller started");

        loop {
            let gap_deadline = self
                .gap_deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86400));

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
                _ = tokio::time::sleep_until(gap_deadline), if self.gap_deadline.is_some() => {
                    self.gap_deadline = None;
                    self.begin_question();
                }
            }

            self.publish_status();
        }

        if self.in_flight {
            self.port.cancel();
        }
        tracing::info!(session_id = %self.session.id, "Playback controller stopped");
    }

    // ========== 命令处理 ==========

    fn handle_command(&mut self, command: TransportCommand) {
        let (result, reply) = match command {
            TransportCommand::Load {
                topic,
                questions,
                reply,
            } => (self.load(topic, questions), reply),
            TransportCommand::Play {
                start_number,
                reply,
            } => (self.play(start_number), reply),
            TransportCommand::Pause { reply } => (self.pause(), reply),
            TransportCommand::Resume { reply } => (self.resume(), reply),
            TransportCommand::Stop { reply } => (self.stop(), reply),
            TransportCommand::Next { reply } => (self.next(), reply),
            TransportCommand::Previous { reply } => (self.previous(), reply),
            TransportCommand::JumpTo {
                question_number,
                reply,
            } => (self.jump_to(question_number), reply),
            TransportCommand::SetMode { mode, reply } => (self.set_mode(mode), reply),
            TransportCommand::SetRate { rate, reply } => (self.set_rate(rate), reply),
            TransportCommand::SetAutoAdvance { enabled, reply } => {
                (self.set_auto_advance(enabled), reply)
            }
        };

        let _ = reply.send(result.map(|()| self.session.snapshot()));
    }

    fn load(&mut self, topic: Topic, questions: Vec<Question>) -> Result<(), ApplicationError> {
        if questions.is_empty() {
            return Err(ApplicationError::validation(format!(
                "Topic {} has no questions",
                topic.id
            )));
        }

        self.cancel_in_flight();
        self.gap_deadline = None;

        tracing::info!(
            session_id = %self.session.id,
            topic_id = %topic.id,
            question_count = questions.len(),
            "Questions loaded"
        );
        self.session.load(topic, questions);
        Ok(())
    }

    fn play(&mut self, start_number: usize) -> Result<(), ApplicationError> {
        match self.session.state {
            PlaybackState::Ready | PlaybackState::Finished => {}
            PlaybackState::Idle => {
                return Err(ApplicationError::invalid_state("No questions loaded"));
            }
            other => {
                return Err(ApplicationError::invalid_state(format!(
                    "Cannot play in state {:?}",
                    other
                )));
            }
        }

        let count = self.session.question_count();
        if start_number == 0 || start_number > count {
            return Err(ApplicationError::validation(format!(
                "Invalid start question {} (valid range 1..={})",
                start_number, count
            )));
        }

        self.session.question_index = start_number - 1;
        tracing::info!(
            session_id = %self.session.id,
            start_number = start_number,
            "Playback started"
        );
        self.begin_question();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), ApplicationError> {
        if self.session.state != PlaybackState::Speaking {
            return Err(ApplicationError::invalid_state("Nothing is being spoken"));
        }

        if self.gap_deadline.is_some() {
            // 题间停顿中暂停：没有在途 utterance，恢复时从下一题开头开始
            self.gap_deadline = None;
            self.session.state = PlaybackState::Paused;
            return Ok(());
        }

        if self.port.pause() {
            self.suspended = true;
        } else {
            // 引擎不支持真实挂起：取消在途 utterance，
            // resume_offset 已由 word boundary 事件维护，恢复时重建文本
            self.cancel_in_flight();
        }
        self.session.state = PlaybackState::Paused;
        tracing::debug!(
            session_id = %self.session.id,
            suspended = self.suspended,
            resume_offset = self.session.resume_offset,
            "Playback paused"
        );
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ApplicationError> {
        if self.session.state != PlaybackState::Paused {
            return Err(ApplicationError::invalid_state("Playback is not paused"));
        }

        if self.suspended && self.port.resume() {
            self.session.state = PlaybackState::Speaking;
        } else if self.session.segments.is_empty() {
            // 题间停顿中暂停的会话：恢复时开始下一题
            self.begin_question();
        } else {
            // 按最近 word boundary 重建文本再提交（词级精度，可能复读个别词）
            self.speak_current();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ApplicationError> {
        if self.session.state == PlaybackState::Idle {
            return Ok(());
        }

        // 幂等：重复 stop 时 in_flight 已为 false，不会再调用端口
        self.cancel_in_flight();
        self.gap_deadline = None;
        self.session.resume_offset = 0;
        self.session.segments.clear();
        self.session.segment_index = 0;
        self.session.state = PlaybackState::Ready;
        Ok(())
    }

    fn next(&mut self) -> Result<(), ApplicationError> {
        if self.session.state == PlaybackState::Idle {
            return Err(ApplicationError::invalid_state("No questions loaded"));
        }
        if !self.session.has_next_question() {
            // 末题钳制为无操作
            return Ok(());
        }
        self.seek_to(self.session.question_index + 1);
        Ok(())
    }

    fn previous(&mut self) -> Result<(), ApplicationError> {
        if self.session.state == PlaybackState::Idle {
            return Err(ApplicationError::invalid_state("No questions loaded"));
        }
        if self.session.question_index == 0 {
            return Ok(());
        }
        self.seek_to(self.session.question_index - 1);
        Ok(())
    }

    fn jump_to(&mut self, question_number: usize) -> Result<(), ApplicationError> {
        if self.session.state == PlaybackState::Idle {
            return Err(ApplicationError::invalid_state("No questions loaded"));
        }
        let count = self.session.question_count();
        if question_number == 0 || question_number > count {
            return Err(ApplicationError::validation(format!(
                "Invalid question {} (valid range 1..={})",
                question_number, count
            )));
        }
        self.seek_to(question_number - 1);
        Ok(())
    }

    fn set_mode(&mut self, mode: NarrationMode) -> Result<(), ApplicationError> {
        self.session.mode = mode;
        self.restart_if_active();
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), ApplicationError> {
        self.session.rate = clamp_rate(rate);
        self.restart_if_active();
        Ok(())
    }

    fn set_auto_advance(&mut self, enabled: bool) -> Result<(), ApplicationError> {
        self.session.auto_advance = enabled;
        if !enabled && self.gap_deadline.is_some() {
            // 停顿中关闭自动推进：等价于片段结束时 autoAdvance=false
            self.gap_deadline = None;
            self.session.state = PlaybackState::Ready;
        }
        Ok(())
    }

    /// 移动题目指针；仅当此前正在朗读时才继续发声（否则为静默跳转）
    fn seek_to(&mut self, index: usize) {
        let was_speaking = self.session.state == PlaybackState::Speaking;
        self.cancel_in_flight();
        self.gap_deadline = None;
        self.session.question_index = index;
        self.session.segment_index = 0;
        self.session.segments.clear();
        self.session.resume_offset = 0;

        if was_speaking {
            self.begin_question();
        } else {
            self.session.state = PlaybackState::Ready;
        }
    }

    // ========== 语音事件处理 ==========

    fn handle_event(&mut self, event: SpeechEvent) {
        // 序列号不匹配或无在途 utterance 的回调一律丢弃
        if !self.in_flight || event.seq != self.seq {
            tracing::trace!(
                event_seq = event.seq,
                current_seq = self.seq,
                "Discarding stale speech event"
            );
            return;
        }

        match event.kind {
            SpeechEventKind::Started => {
                tracing::debug!(seq = event.seq, "Utterance started");
            }
            SpeechEventKind::WordBoundary { char_offset } => {
                self.session.resume_offset = self.segment_base + char_offset;
            }
            SpeechEventKind::Finished => {
                self.in_flight = false;
                self.segment_ends();
            }
            SpeechEventKind::Failed { error } => {
                self.in_flight = false;
                if error.is_fatal() {
                    tracing::error!(error = %error, "Speech capability lost");
                    self.fail_session();
                } else {
                    // 单个 utterance 失败按片段结束处理，保证会话不被卡死
                    tracing::warn!(error = %error, "Utterance failed, skipping forward");
                    self.segment_ends();
                }
            }
        }
    }

    /// 当前片段结束（正常完成或按失败跳过）后的推进逻辑
    fn segment_ends(&mut self) {
        if self.session.has_next_segment() {
            self.session.segment_index += 1;
            self.session.resume_offset = 0;
            self.speak_current();
        } else if self.session.has_next_question() && self.session.auto_advance {
            // 题间停顿让听者感知题目切换，停顿期间状态仍为 Speaking
            self.session.question_index += 1;
            self.session.segment_index = 0;
            self.session.segments.clear();
            self.session.resume_offset = 0;
            self.gap_deadline = Some(Instant::now() + self.gap);
        } else if !self.session.has_next_question() {
            tracing::info!(session_id = %self.session.id, "Narration finished");
            self.session.state = PlaybackState::Finished;
        } else {
            self.session.state = PlaybackState::Ready;
        }
    }

    /// 从当前题目指针开始朗读，损坏的题目跳过并告警
    fn begin_question(&mut self) {
        loop {
            let number = self.session.question_index + 1;
            let question = match self.session.current_question() {
                Some(q) => q,
                None => {
                    self.session.state = PlaybackState::Finished;
                    return;
                }
            };
            let question_id = question.id.clone();

            match build_segments(question, number, self.session.mode) {
                Ok(segments) => {
                    self.session.segments = segments;
                    self.session.segment_index = 0;
                    self.session.resume_offset = 0;
                    self.speak_current();
                    return;
                }
                Err(error) => {
                    tracing::warn!(
                        question_id = %question_id,
                        question_number = number,
                        error = %error,
                        "Skipping malformed question"
                    );
                    if self.session.has_next_question() {
                        self.session.question_index += 1;
                    } else {
                        self.session.state = PlaybackState::Finished;
                        return;
                    }
                }
            }
        }
    }

    /// 提交当前片段的 utterance
    fn speak_current(&mut self) {
        let segment = match self.session.current_segment() {
            Some(s) => s.clone(),
            None => {
                self.session.state = PlaybackState::Ready;
                return;
            }
        };

        // 续播时从包含 resume_offset 的单词起点重建文本
        let (text, base) = if self.session.resume_offset > 0 {
            suffix_from_word(&segment.text, self.session.resume_offset)
        } else {
            (segment.text.clone(), 0)
        };

        // 音色列表可能异步变化，每次发声前重新查询、重新选择
        let voices = self.port.list_voices();
        let voice = select_voice(segment.role, &voices, &self.preferences);
        if voice.is_none() {
            tracing::debug!(
                role = ?segment.role,
                "No voice matched, falling back to engine default"
            );
        }

        self.cancel_in_flight();
        self.seq += 1;
        self.segment_base = base;

        let request = UtteranceRequest {
            seq: self.seq,
            text,
            voice: voice.map(|v| v.handle.clone()),
            rate: self.session.rate,
            pitch: self.session.pitch,
        };

        match self.port.speak(request) {
            Ok(()) => {
                self.in_flight = true;
                self.suspended = false;
                self.session.state = PlaybackState::Speaking;
            }
            Err(error) if error.is_fatal() => {
                tracing::error!(error = %error, "Speech capability unavailable");
                self.fail_session();
            }
            Err(error) => {
                tracing::warn!(error = %error, "Utterance submission failed, skipping forward");
                self.segment_ends();
            }
        }
    }

    /// Speaking/Paused 状态下的语速或模式变更从当前题目开头重新生效，
    /// 而不是在片段中途切换（中途切换会产生不一致的韵律）
    fn restart_if_active(&mut self) {
        match self.session.state {
            PlaybackState::Speaking => {
                self.gap_deadline = None;
                self.session.segment_index = 0;
                self.session.resume_offset = 0;
                self.begin_question();
            }
            PlaybackState::Paused => {
                self.cancel_in_flight();
                self.session.segments.clear();
                self.session.segment_index = 0;
                self.session.resume_offset = 0;
            }
            _ => {}
        }
    }

    fn cancel_in_flight(&mut self) {
        if self.in_flight {
            self.port.cancel();
            self.in_flight = false;
            self.suspended = false;
        }
    }

    fn fail_session(&mut self) {
        self.gap_deadline = None;
        self.in_flight = false;
        self.suspended = false;
        self.session.state = PlaybackState::Failed;
    }

    fn publish_status(&mut self) {
        let status = self.session.snapshot();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// 返回从包含 `char_offset` 的单词起点开始的后缀，以及该起点的字符下标
///
/// word boundary 只有词级精度，截断始终回退到词首，宁可复读一个词
/// 也不跳词
fn suffix_from_word(text: &str, char_offset: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    if char_offset >= chars.len() {
        return (String::new(), chars.len());
    }

    let mut start = 0;
    for (i, ch) in chars.iter().enumerate() {
        if i >= char_offset {
            break;
        }
        if ch.is_whitespace() {
            start = i + 1;
        }
    }

    (chars[start..].iter().collect(), start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SpeechError;
    use crate::infrastructure::speech::{ScriptedSpeechPort, ScriptedSpeechPortConfig};
    use std::time::Duration;

    fn question(id: &str, text: &str, options: &[&str], correct: &str) -> Question {
        Question {
            id: id.to_string(),
            question_text: text.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_option: correct.to_string(),
            tips: None,
        }
    }

    fn topic() -> Topic {
        Topic {
            id: "t1".to_string(),
            name: "Test Topic".to_string(),
            short_name: "TT".to_string(),
        }
    }

    fn settings() -> PlaybackSettings {
        PlaybackSettings {
            mode: NarrationMode::Full,
            rate: 0.9,
            pitch: 1.0,
            gap: Duration::from_millis(500),
            preferences: VoicePreferences {
                language: "es-ES".to_string(),
                ..Default::default()
            },
        }
    }

    fn scripted_config() -> ScriptedSpeechPortConfig {
        ScriptedSpeechPortConfig {
            word_duration: Duration::from_millis(50),
            supports_suspension: false,
            ..Default::default()
        }
    }

    fn setup(
        config: ScriptedSpeechPortConfig,
        settings: PlaybackSettings,
    ) -> (PlaybackHandle, Arc<ScriptedSpeechPort>) {
        let (port, events) = ScriptedSpeechPort::new(config);
        let handle = PlaybackController::spawn(port.clone(), events, settings);
        (handle, port)
    }

    /// 等待控制器处理完已投递的事件（让出调度即可，时间是暂停的）
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_suffix_from_word_at_boundary() {
        let (suffix, start) = suffix_from_word("Question 1. Q1", 9);
        assert_eq!(suffix, "1. Q1");
        assert_eq!(start, 9);
    }

    #[test]
    fn test_suffix_from_word_mid_word_snaps_back() {
        // 偏移落在词中间时回退到词首
        let (suffix, start) = suffix_from_word("Correct answer: B. b", 10);
        assert_eq!(suffix, "answer: B. b");
        assert_eq!(start, 8);
    }

    #[test]
    fn test_suffix_from_word_past_end() {
        let (suffix, start) = suffix_from_word("abc", 10);
        assert_eq!(suffix, "");
        assert_eq!(start, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_speaks_first_segment() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "a")])
            .await
            .unwrap();

        let status = handle.play(1).await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);
        assert_eq!(port.spoken_texts(), vec!["Question 1. Q1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_question_runs_to_finished() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b", "c"], "b")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;

        assert_eq!(
            port.spoken_texts(),
            vec![
                "Question 1. Q1".to_string(),
                "Options: A. a. B. b. C. c.".to_string(),
                "Correct answer: B. b".to_string(),
            ]
        );
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_chains_questions() {
        // Scenario: 两题会话，autoAdvance=true，Q1 全部片段完成后
        // 控制器自动提交 Q2 的第一个片段，最后进入 Finished
        let (handle, port) = setup(
            scripted_config(),
            PlaybackSettings {
                mode: NarrationMode::CorrectOnly,
                ..settings()
            },
        );
        handle
            .load(
                topic(),
                vec![
                    question("q1", "Q1", &["a", "b"], "a"),
                    question("q2", "Q2", &["x", "y"], "y"),
                ],
            )
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(
            port.spoken_texts(),
            vec![
                "Question 1. Q1".to_string(),
                "Correct answer: A. a".to_string(),
                "Question 2. Q2".to_string(),
                "Correct answer: B. y".to_string(),
            ]
        );
        assert_eq!(handle.status().state, PlaybackState::Finished);
        assert!(!port.overlap_detected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_disabled_lands_ready() {
        let (handle, port) = setup(
            scripted_config(),
            PlaybackSettings {
                mode: NarrationMode::CorrectOnly,
                ..settings()
            },
        );
        handle
            .load(
                topic(),
                vec![
                    question("q1", "Q1", &["a", "b"], "a"),
                    question("q2", "Q2", &["x", "y"], "y"),
                ],
            )
            .await
            .unwrap();
        handle.set_auto_advance(false).await.unwrap();
        handle.play(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;

        // 只朗读了 Q1，停在 Ready
        assert_eq!(port.spoken_texts().len(), 2);
        assert_eq!(handle.status().state, PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_stop_is_idempotent() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        let status = handle.stop().await.unwrap();
        assert_eq!(status.state, PlaybackState::Ready);
        let cancels_after_first = port.cancel_count();
        assert_eq!(cancels_after_first, 1);

        let status = handle.stop().await.unwrap();
        assert_eq!(status.state, PlaybackState::Ready);
        // 第二次 stop 不产生额外端口调用
        assert_eq!(port.cancel_count(), cancels_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_events_after_stop_are_discarded() {
        let (handle, _port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();
        handle.stop().await.unwrap();

        // 被取消 utterance 的迟到回调不得改变会话状态
        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(handle.status().state, PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_to_last_then_next_is_clamped() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(
                topic(),
                vec![
                    question("q1", "Q1", &["a"], "a"),
                    question("q2", "Q2", &["a"], "a"),
                    question("q3", "Q3", &["a"], "a"),
                ],
            )
            .await
            .unwrap();

        // 静默跳转：此前不在朗读，指针移动但不发声
        let status = handle.jump_to(3).await.unwrap();
        assert_eq!(status.state, PlaybackState::Ready);
        assert_eq!(status.question_index, 2);
        assert!(port.spoken_texts().is_empty());

        // 末题之后 next 不再前进也不报错
        let status = handle.next().await.unwrap();
        assert_eq!(status.question_index, 2);
        assert_eq!(status.state, PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_while_speaking_keeps_speaking() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(
                topic(),
                vec![
                    question("q1", "Q1", &["a"], "a"),
                    question("q2", "Q2", &["a"], "a"),
                ],
            )
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        let status = handle.next().await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);
        assert_eq!(status.question_index, 1);
        assert_eq!(
            port.spoken_texts().last().unwrap(),
            "Question 2. Q2"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_question_is_skipped() {
        // Scenario: correct_option 不在 options 中的题目被整题跳过，
        // 不为其提交任何 utterance
        let (handle, port) = setup(
            scripted_config(),
            PlaybackSettings {
                mode: NarrationMode::CorrectOnly,
                ..settings()
            },
        );
        handle
            .load(
                topic(),
                vec![
                    question("bad", "Broken", &["a", "b"], "zzz"),
                    question("good", "Fine", &["a", "b"], "a"),
                ],
            )
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;

        let texts = port.spoken_texts();
        assert!(texts.iter().all(|t| !t.contains("Broken")));
        assert_eq!(texts.first().unwrap(), "Question 2. Fine");
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_rate_restarts_current_question() {
        // Scenario: Speaking 中途 setRate(2) → 从当前题目的 Narrator
        // 片段按新语速重新开始，而不是中途续播
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        // 推进到 Options 片段
        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert!(port.spoken_texts().len() >= 2);

        let status = handle.set_rate(2.0).await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);
        assert!((status.rate - 2.0).abs() < f32::EPSILON);

        let log = port.requests();
        let last = log.last().unwrap();
        assert_eq!(last.text, "Question 1. Q1");
        assert!((last.rate - 2.0).abs() < f32::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_mode_restarts_current_question() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "b")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        handle.set_mode(NarrationMode::CorrectOnly).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;

        let texts = port.spoken_texts();
        // 模式变更触发从题目开头重新朗读
        assert!(texts.iter().filter(|t| *t == "Question 1. Q1").count() >= 2);
        // 重启后按 CorrectOnly 展开：不再提交 Options 片段
        let restart = texts.iter().rposition(|t| t == "Question 1. Q1").unwrap();
        assert!(texts[restart..].iter().all(|t| !t.starts_with("Options:")));
        assert_eq!(texts.last().unwrap(), "Correct answer: B. b");
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_without_suspension_rebuilds_text() {
        let (handle, port) = setup(scripted_config(), settings());
        handle
            .load(
                topic(),
                vec![question("q1", "one two three four five", &["a"], "a")],
            )
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        // 让几个 word boundary 先到达
        tokio::time::sleep(Duration::from_millis(120)).await;
        settle().await;

        let status = handle.pause().await.unwrap();
        assert_eq!(status.state, PlaybackState::Paused);
        assert_eq!(port.cancel_count(), 1);

        let status = handle.resume().await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);

        let requests = port.requests();
        let resumed = &requests.last().unwrap().text;
        let original = "Question 1. one two three four five";
        // 重建文本是原文按词边界截断的后缀
        assert!(resumed.len() < original.len());
        assert!(original.ends_with(resumed.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_with_true_suspension() {
        let config = ScriptedSpeechPortConfig {
            supports_suspension: true,
            ..scripted_config()
        };
        let (handle, port) = setup(config, settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        let before = port.requests().len();
        let status = handle.pause().await.unwrap();
        assert_eq!(status.state, PlaybackState::Paused);
        // 真实挂起不取消在途 utterance
        assert_eq!(port.cancel_count(), 0);

        let status = handle.resume().await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);
        // 也不重新提交
        assert_eq!(port.requests().len(), before);

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capability_unavailable_fails_session() {
        let config = ScriptedSpeechPortConfig {
            capability_available: false,
            ..scripted_config()
        };
        let (handle, _port) = setup(config, settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a"], "a")])
            .await
            .unwrap();

        let status = handle.play(1).await.unwrap();
        assert_eq!(status.state, PlaybackState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_failure_skips_to_next_segment() {
        let config = ScriptedSpeechPortConfig {
            fail_on_substring: Some("Options".to_string()),
            ..scripted_config()
        };
        let (handle, port) = setup(config, settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a", "b"], "b")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;

        // Options 片段失败被当作片段结束，答案片段仍被朗读
        assert_eq!(
            port.spoken_texts().last().unwrap(),
            "Correct answer: B. b"
        );
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_rejects_invalid_start() {
        let (handle, _port) = setup(scripted_config(), settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a"], "a")])
            .await
            .unwrap();

        assert!(handle.play(0).await.is_err());
        assert!(handle.play(2).await.is_err());
        assert_eq!(handle.status().state, PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_before_load_rejected() {
        let (handle, _port) = setup(scripted_config(), settings());
        assert!(handle.play(1).await.is_err());
        assert_eq!(handle.status().state, PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_commands_never_overlap_utterances() {
        let (handle, port) = setup(scripted_config(), settings());
        let questions: Vec<_> = (0..5)
            .map(|i| question(&format!("q{}", i), &format!("Q{}", i), &["a", "b"], "a"))
            .collect();
        handle.load(topic(), questions).await.unwrap();
        handle.play(1).await.unwrap();

        // 快速交错的传输命令风暴
        handle.next().await.unwrap();
        handle.set_rate(1.5).await.unwrap();
        handle.jump_to(4).await.unwrap();
        handle.pause().await.unwrap();
        handle.resume().await.unwrap();
        handle.previous().await.unwrap();
        handle.set_mode(NarrationMode::CorrectOnly).await.unwrap();
        handle.stop().await.unwrap();
        handle.play(2).await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;

        // 任意时刻至多一个"活"utterance
        assert!(!port.overlap_detected());
        assert_eq!(handle.status().state, PlaybackState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_after_finished() {
        let (handle, port) = setup(
            scripted_config(),
            PlaybackSettings {
                mode: NarrationMode::CorrectOnly,
                ..settings()
            },
        );
        handle
            .load(topic(), vec![question("q1", "Q1", &["a"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(handle.status().state, PlaybackState::Finished);

        // Finished 状态允许重新 play，无需重新 load
        let status = handle.play(1).await.unwrap();
        assert_eq!(status.state, PlaybackState::Speaking);
        assert!(port.spoken_texts().len() > 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_voice_matched_still_speaks_with_default() {
        // 空音色列表：回退到引擎默认音色而不是阻塞
        let config = ScriptedSpeechPortConfig {
            voices: Vec::new(),
            ..scripted_config()
        };
        let (handle, port) = setup(config, settings());
        handle
            .load(topic(), vec![question("q1", "Q1", &["a"], "a")])
            .await
            .unwrap();
        handle.play(1).await.unwrap();

        let requests = port.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].voice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_failure_is_nonfatal() {
        let error = SpeechError::UtteranceFailure("boom".to_string());
        assert!(!error.is_fatal());
        let error = SpeechError::CapabilityUnavailable("gone".to_string());
        assert!(error.is_fatal());
    }
}
