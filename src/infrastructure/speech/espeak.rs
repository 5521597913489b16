//! Espeak Speech Port - espeak-ng 进程适配器
//!
//! 每次发声 spawn 一个 espeak-ng 进程，cancel 时杀掉进程。
//! espeak-ng 命令行不回报单词边界，这里按语速估算单词时长并用
//! 定时器发出 WordBoundary 事件（词级精度，续播可能复读个别词）。
//!
//! espeak-ng 不支持挂起在途发声，pause/resume 恒返回 false，由
//! 控制器退化为 cancel + 按偏移重建。

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::{mpsc, Notify};

use crate::application::ports::{
    SpeechError, SpeechEvent, SpeechEventKind, SpeechEventReceiver, SpeechEventSender, SpeechPort,
    UtteranceRequest,
};
use crate::domain::narration::{GenderHint, VoiceProfile};

/// espeak-ng 的基准语速（words per minute，对应 rate = 1.0）
const BASE_WPM: f32 = 175.0;

/// Espeak 引擎配置
#[derive(Debug, Clone)]
pub struct EspeakSpeechPortConfig {
    /// espeak-ng 可执行文件
    pub binary: String,
}

impl Default for EspeakSpeechPortConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".to_string(),
        }
    }
}

/// espeak-ng 进程适配器
pub struct EspeakSpeechPort {
    config: EspeakSpeechPortConfig,
    events: SpeechEventSender,
    /// 当前在途 utterance 的取消信号；notify_one 会暂存 permit，
    /// 即使任务尚未 poll 也不会丢失取消
    cancel_notify: Mutex<Arc<Notify>>,
    voices: Mutex<Vec<VoiceProfile>>,
}

impl EspeakSpeechPort {
    /// 探测 espeak-ng 并加载音色列表
    ///
    /// 二进制不存在视为语音能力缺失（致命）
    pub fn new(
        config: EspeakSpeechPortConfig,
    ) -> Result<(Arc<Self>, SpeechEventReceiver), SpeechError> {
        let output = std::process::Command::new(&config.binary)
            .arg("--voices")
            .output()
            .map_err(|e| {
                SpeechError::CapabilityUnavailable(format!(
                    "Cannot execute {}: {}",
                    config.binary, e
                ))
            })?;

        if !output.status.success() {
            return Err(SpeechError::CapabilityUnavailable(format!(
                "{} --voices exited with {}",
                config.binary, output.status
            )));
        }

        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        tracing::info!(
            binary = %config.binary,
            voice_count = voices.len(),
            "Espeak speech port initialized"
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let port = Arc::new(Self {
            config,
            events: events_tx,
            cancel_notify: Mutex::new(Arc::new(Notify::new())),
            voices: Mutex::new(voices),
        });
        Ok((port, events_rx))
    }
}

impl SpeechPort for EspeakSpeechPort {
    fn speak(&self, request: UtteranceRequest) -> Result<(), SpeechError> {
        let wpm = (BASE_WPM * request.rate).round() as u32;
        // espeak -p 取 0-99，默认 50；pitch 1.0 映射到 50
        let pitch = (request.pitch * 50.0).clamp(0.0, 99.0).round() as u32;

        let mut command = Command::new(&self.config.binary);
        if let Some(voice) = &request.voice {
            command.arg("-v").arg(voice);
        }
        command
            .arg("-s")
            .arg(wpm.to_string())
            .arg("-p")
            .arg(pitch.to_string())
            .arg("--")
            .arg(&request.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            SpeechError::CapabilityUnavailable(format!(
                "Cannot spawn {}: {}",
                self.config.binary, e
            ))
        })?;

        let events = self.events.clone();
        let notify = Arc::new(Notify::new());
        *self.cancel_notify.lock().unwrap() = notify.clone();
        let seq = request.seq;
        let text = request.text.clone();
        let word_duration = Duration::from_secs_f32(60.0 / wpm.max(1) as f32);

        tokio::spawn(async move {
            let _ = events.send(SpeechEvent {
                seq,
                kind: SpeechEventKind::Started,
            });

            // 定时器估算单词边界
            let boundary_events = events.clone();
            let boundary_task = tokio::spawn(async move {
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
                for offset in offsets {
                    let _ = boundary_events.send(SpeechEvent {
                        seq,
                        kind: SpeechEventKind::WordBoundary {
                            char_offset: offset,
                        },
                    });
                    tokio::time::sleep(word_duration).await;
                }
            });

            tokio::select! {
                status = child.wait() => {
                    boundary_task.abort();
                    let kind = match status {
                        Ok(status) if status.success() => SpeechEventKind::Finished,
                        Ok(status) => SpeechEventKind::Failed {
                            error: SpeechError::UtteranceFailure(format!(
                                "espeak exited with {}",
                                status
                            )),
                        },
                        Err(e) => SpeechEventKind::Failed {
                            error: SpeechError::UtteranceFailure(format!(
                                "Failed to wait for espeak: {}",
                                e
                            )),
                        },
                    };
                    // 过期事件由控制器按序列号丢弃，这里直接发送
                    let _ = events.send(SpeechEvent { seq, kind });
                }
                _ = notify.notified() => {
                    boundary_task.abort();
                    let _ = child.kill().await;
                    tracing::debug!(seq = seq, "Utterance process killed");
                }
            }
        });

        Ok(())
    }

    fn cancel(&self) {
        self.cancel_notify.lock().unwrap().notify_one();
    }

    fn pause(&self) -> bool {
        false
    }

    fn resume(&self) -> bool {
        false
    }

    fn list_voices(&self) -> Vec<VoiceProfile> {
        self.voices.lock().unwrap().clone()
    }
}

/// 解析 `espeak-ng --voices` 的表格输出
///
/// 格式示例:
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  es              M  spanish              europe/es
///  5  es-419          M  spanish-latin-am     es-la
/// ```
fn parse_voice_list(output: &str) -> Vec<VoiceProfile> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let language = fields[1].to_string();
            let gender = match fields[2] {
                "M" => GenderHint::Male,
                "F" => GenderHint::Female,
                _ => GenderHint::from_name(fields[3]),
            };
            Some(VoiceProfile {
                handle: fields[3].to_string(),
                language,
                gender,
            })
        })
        .collect()
}
