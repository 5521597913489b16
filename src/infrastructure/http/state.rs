//! Application State
//!
//! HTTP 层共享状态：播放控制句柄 + 题库端口

use std::sync::Arc;

use crate::application::{PlaybackHandle, QuestionCatalogPort};

/// 应用状态
pub struct AppState {
    /// 播放控制器句柄（命令通道 + 状态订阅）
    pub playback: PlaybackHandle,
    /// 上游题库
    pub catalog: Arc<dyn QuestionCatalogPort>,
}

impl AppState {
    pub fn new(playback: PlaybackHandle, catalog: Arc<dyn QuestionCatalogPort>) -> Self {
        Self { playback, catalog }
    }
}
