//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 上游题库 API 配置
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// 语音引擎配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 朗读配置
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 上游题库 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// 题库服务基础 URL
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_upstream_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

/// 语音引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 引擎类型
    /// 可选: espeak, scripted
    #[serde(default = "default_speech_engine")]
    pub engine: String,

    /// espeak-ng 可执行文件路径
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: String,

    /// scripted 引擎的单词时长（毫秒，仅用于模拟）
    #[serde(default = "default_word_duration")]
    pub word_duration_ms: u64,
}

fn default_speech_engine() -> String {
    "espeak".to_string()
}

fn default_espeak_binary() -> String {
    "espeak-ng".to_string()
}

fn default_word_duration() -> u64 {
    300
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: default_speech_engine(),
            espeak_binary: default_espeak_binary(),
            word_duration_ms: default_word_duration(),
        }
    }
}

/// 朗读配置
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 目标语言标签（用于音色选择）
    #[serde(default = "default_language")]
    pub language: String,

    /// 默认语速 (0.5 - 2.0)
    #[serde(default = "default_rate")]
    pub rate: f32,

    /// 音调
    #[serde(default = "default_pitch")]
    pub pitch: f32,

    /// 题目间自动推进的停顿时长（毫秒）
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,

    /// 旁白角色偏好音色名称列表（按优先级）
    #[serde(default)]
    pub narrator_voices: Vec<String>,

    /// 选项/答案朗读角色偏好音色名称列表（按优先级）
    #[serde(default)]
    pub reader_voices: Vec<String>,
}

fn default_language() -> String {
    "es-ES".to_string()
}

fn default_rate() -> f32 {
    0.9
}

fn default_pitch() -> f32 {
    1.0
}

fn default_gap_ms() -> u64 {
    1000
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            rate: default_rate(),
            pitch: default_pitch(),
            gap_ms: default_gap_ms(),
            narrator_voices: Vec::new(),
            reader_voices: Vec::new(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
