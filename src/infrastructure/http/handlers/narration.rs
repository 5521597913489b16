//! Narration Handlers - 播放控制
//!
//! 所有命令都转发给播放控制器 actor，返回命令生效后的会话快照

use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::application::ApplicationError;
use crate::domain::narration::PlaybackStatus;
use crate::infrastructure::http::dto::{
    ApiResponse, JumpRequest, LoadRequest, PlayRequest, SetAutoAdvanceRequest, SetModeRequest,
    SetRateRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type StatusResult = Result<Json<ApiResponse<PlaybackStatus>>, ApiError>;

fn reply(result: Result<PlaybackStatus, ApplicationError>) -> StatusResult {
    Ok(Json(ApiResponse::success(result?)))
}

/// POST /api/narration/load - 拉取主题题目并装载会话
pub async fn load(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadRequest>,
) -> StatusResult {
    let topic = state
        .catalog
        .fetch_topic(&request.topic_id)
        .await
        .map_err(ApplicationError::from)?;
    let questions = state
        .catalog
        .fetch_questions(&request.topic_id)
        .await
        .map_err(ApplicationError::from)?;

    tracing::info!(
        topic_id = %topic.id,
        topic_name = %topic.name,
        question_count = questions.len(),
        "Loading playback session"
    );

    reply(state.playback.load(topic, questions).await)
}

/// POST /api/narration/play - 从指定题号开始朗读
pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlayRequest>,
) -> StatusResult {
    reply(state.playback.play(request.question_number).await)
}

/// POST /api/narration/pause
pub async fn pause(State(state): State<Arc<AppState>>) -> StatusResult {
    reply(state.playback.pause().await)
}

/// POST /api/narration/resume
pub async fn resume(State(state): State<Arc<AppState>>) -> StatusResult {
    reply(state.playback.resume().await)
}

/// POST /api/narration/stop
pub async fn stop(State(state): State<Arc<AppState>>) -> StatusResult {
    reply(state.playback.stop().await)
}

/// POST /api/narration/next
pub async fn next(State(state): State<Arc<AppState>>) -> StatusResult {
    reply(state.playback.next().await)
}

/// POST /api/narration/previous
pub async fn previous(State(state): State<Arc<AppState>>) -> StatusResult {
    reply(state.playback.previous().await)
}

/// POST /api/narration/jump
pub async fn jump(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JumpRequest>,
) -> StatusResult {
    reply(state.playback.jump_to(request.question_number).await)
}

/// POST /api/narration/mode - 切换朗读模式
pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetModeRequest>,
) -> StatusResult {
    reply(state.playback.set_mode(request.mode).await)
}

/// POST /api/narration/rate - 调整语速
pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetRateRequest>,
) -> StatusResult {
    reply(state.playback.set_rate(request.rate).await)
}

/// POST /api/narration/auto_advance - 开关自动续播
pub async fn set_auto_advance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetAutoAdvanceRequest>,
) -> StatusResult {
    reply(state.playback.set_auto_advance(request.enabled).await)
}

/// GET /api/narration/status - 当前会话快照
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PlaybackStatus>> {
    Json(ApiResponse::success(state.playback.status()))
}
