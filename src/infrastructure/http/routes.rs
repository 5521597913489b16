//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                        GET   健康检查
//! - /api/topics                      GET   列出主题
//! - /api/topics/:topic_id            GET   主题详情
//! - /api/questions/topic/:topic_id   GET   主题下全部题目
//! - /api/narration/load              POST  装载主题（拉取题目）
//! - /api/narration/play              POST  从指定题号开始朗读
//! - /api/narration/pause             POST  暂停
//! - /api/narration/resume            POST  恢复
//! - /api/narration/stop              POST  停止并回到 Ready
//! - /api/narration/next              POST  下一题
//! - /api/narration/previous          POST  上一题
//! - /api/narration/jump              POST  跳转到题号
//! - /api/narration/mode              POST  切换朗读模式
//! - /api/narration/rate              POST  调整语速
//! - /api/narration/auto_advance      POST  开关自动续播
//! - /api/narration/status            GET   会话快照
//! - /ws/status                       WS    状态推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/status", get(handlers::status_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/topics", get(handlers::list_topics))
        .route("/topics/:topic_id", get(handlers::get_topic))
        .route(
            "/questions/topic/:topic_id",
            get(handlers::list_questions),
        )
        .nest("/narration", narration_routes())
}

/// Narration 路由
fn narration_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/load", post(handlers::load))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/stop", post(handlers::stop))
        .route("/next", post(handlers::next))
        .route("/previous", post(handlers::previous))
        .route("/jump", post(handlers::jump))
        .route("/mode", post(handlers::set_mode))
        .route("/rate", post(handlers::set_rate))
        .route("/auto_advance", post(handlers::set_auto_advance))
        .route("/status", get(handlers::status))
}
