//! 基础设施层
//!
//! 包含：
//! - http: axum HTTP/WebSocket 服务器
//! - speech: 语音引擎适配器（espeak / scripted）
//! - upstream: 上游题库 HTTP 客户端

pub mod http;
pub mod speech;
pub mod upstream;
