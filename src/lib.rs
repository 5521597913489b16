//! Balotario - 考题语音朗读系统
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Question Context: 题库数据（题目、主题）
//! - Narration Context: 朗读脚本、音色选择、播放会话状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechPort, QuestionCatalogPort）
//! - Playback: 播放控制器（单线程 actor，持有 PlaybackSession）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful 控制接口 + 状态 WebSocket
//! - Speech: espeak-ng 进程适配器 / Scripted 模拟适配器
//! - Upstream: 题库 CRUD API 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
