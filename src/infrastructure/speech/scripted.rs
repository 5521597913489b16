//! Scripted Speech Port - 模拟语音引擎
//!
//! 不产生真实音频，按固定单词时长模拟发声进度事件。用于测试，
//! 也可作为无声开发引擎在 main 中选用。

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::application::ports::{
    SpeechError, SpeechEvent, SpeechEventKind, SpeechEventReceiver, SpeechEventSender, SpeechPort,
    UtteranceRequest,
};
use crate::domain::narration::{GenderHint, VoiceProfile};

/// Scripted 引擎配置
#[derive(Debug, Clone)]
pub struct ScriptedSpeechPortConfig {
    /// 每个单词的模拟发声时长
    pub word_duration: Duration,
    /// 是否支持真实挂起（pause/resume 返回值）
    pub supports_suspension: bool,
    /// 模拟语音能力是否可用；false 时 speak 返回致命错误
    pub capability_available: bool,
    /// 文本包含该子串的 utterance 以 UtteranceFailure 结束
    pub fail_on_substring: Option<String>,
    /// 上报的音色列表
    pub voices: Vec<VoiceProfile>,
}

impl Default for ScriptedSpeechPortConfig {
    fn default() -> Self {
        Self {
            word_duration: Duration::from_millis(300),
            supports_suspension: false,
            capability_available: true,
            fail_on_substring: None,
            voices: vec![
                VoiceProfile {
                    handle: "Spanish Male".to_string(),
                    language: "es-ES".to_string(),
                    gender: GenderHint::Male,
                },
                VoiceProfile {
                    handle: "Spanish Female".to_string(),
                    language: "es-ES".to_string(),
                    gender: GenderHint::Female,
                },
            ],
        }
    }
}

struct Shared {
    /// 当前接受的 utterance 纪元；cancel/新提交都会推进
    epoch: AtomicU64,
    /// 是否存在未完成且未取消的 utterance
    active: AtomicBool,
    /// 检测到两个 utterance 同时存活（调用方违反了单在途不变量）
    overlap: AtomicBool,
    cancels: AtomicUsize,
    requests: Mutex<Vec<UtteranceRequest>>,
    voices: Mutex<Vec<VoiceProfile>>,
}

/// 模拟语音引擎
pub struct ScriptedSpeechPort {
    config: ScriptedSpeechPortConfig,
    events: SpeechEventSender,
    shared: Arc<Shared>,
    pause_tx: watch::Sender<bool>,
}

impl ScriptedSpeechPort {
    /// 创建引擎与事件接收端
    pub fn new(config: ScriptedSpeechPortConfig) -> (Arc<Self>, SpeechEventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (pause_tx, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            epoch: AtomicU64::new(0),
            active: AtomicBool::new(false),
            overlap: AtomicBool::new(false),
            cancels: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            voices: Mutex::new(config.voices.clone()),
        });
        let port = Arc::new(Self {
            config,
            events: events_tx,
            shared,
            pause_tx,
        });
        (port, events_rx)
    }

    /// 模拟音色异步加载：替换上报的音色列表
    pub fn set_voices(&self, voices: Vec<VoiceProfile>) {
        *self.shared.voices.lock().unwrap() = voices;
    }

    /// 全部提交过的请求
    pub fn requests(&self) -> Vec<UtteranceRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// 全部提交过的文本
    pub fn spoken_texts(&self) -> Vec<String> {
        self.shared
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.shared.cancels.load(Ordering::SeqCst)
    }

    pub fn overlap_detected(&self) -> bool {
        self.shared.overlap.load(Ordering::SeqCst)
    }
}

/// 文本中每个单词的字符起始下标
fn word_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut in_word = false;
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            offsets.push(i);
            in_word = true;
        }
    }
    offsets
}

impl SpeechPort for ScriptedSpeechPort {
    fn speak(&self, request: UtteranceRequest) -> Result<(), SpeechError> {
        if !self.config.capability_available {
            return Err(SpeechError::CapabilityUnavailable(
                "Scripted engine configured as unavailable".to_string(),
            ));
        }

        if self.shared.active.swap(true, Ordering::SeqCst) {
            // 调用方没有先 cancel 就提交了新 utterance
            self.shared.overlap.store(true, Ordering::SeqCst);
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.requests.lock().unwrap().push(request.clone());

        let shared = self.shared.clone();
        let events = self.events.clone();
        let mut pause_rx = self.pause_tx.subscribe();
        let word_duration = self.config.word_duration;
        let fail_on = self.config.fail_on_substring.clone();
        let seq = request.seq;
        let text = request.text;

        tokio::spawn(async move {
            let _ = events.send(SpeechEvent {
                seq,
                kind: SpeechEventKind::Started,
            });

            if let Some(pattern) = fail_on {
                if text.contains(&pattern) {
                    tokio::time::sleep(word_duration).await;
                    if shared.epoch.load(Ordering::SeqCst) == epoch {
                        shared.active.store(false, Ordering::SeqCst);
                        let _ = events.send(SpeechEvent {
                            seq,
                            kind: SpeechEventKind::Failed {
                                error: SpeechError::UtteranceFailure(
                                    "Scripted utterance failure".to_string(),
                                ),
                            },
                        });
                    }
                    return;
                }
            }

            for offset in word_offsets(&text) {
                // 挂起期间等待恢复
                while *pause_rx.borrow() {
                    if pause_rx.changed().await.is_err() {
                        return;
                    }
                }
                if shared.epoch.load(Ordering::SeqCst) != epoch {
                    // 已被取消或被新 utterance 取代
                    return;
                }
                let _ = events.send(SpeechEvent {
                    seq,
                    kind: SpeechEventKind::WordBoundary {
                        char_offset: offset,
                    },
                });
                tokio::time::sleep(word_duration).await;
            }

            if shared.epoch.load(Ordering::SeqCst) == epoch {
                shared.active.store(false, Ordering::SeqCst);
                let _ = events.send(SpeechEvent {
                    seq,
                    kind: SpeechEventKind::Finished,
                });
            }
        });

        Ok(())
    }

    fn cancel(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.active.store(false, Ordering::SeqCst);
        self.shared.cancels.fetch_add(1, Ordering::SeqCst);
        let _ = self.pause_tx.send(false);
    }

    fn pause(&self) -> bool {
        if !self.config.supports_suspension {
            return false;
        }
        let _ = self.pause_tx.send(true);
        true
    }

    fn resume(&self) -> bool {
        if !self.config.supports_suspension {
            return false;
        }
        let _ = self.pause_tx.send(false);
        true
    }

    fn list_voices(&self) -> Vec<VoiceProfile> {
        self.shared.voices.lock().unwrap().clone()
    }
}
