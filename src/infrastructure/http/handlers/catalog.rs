//! Catalog Handlers - 题库透传
//!
//! 题库维护属于上游系统，这里只读透传给前端

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::application::ApplicationError;
use crate::domain::question::{Question, Topic};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// GET /api/topics - 列出全部主题
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Topic>>>, ApiError> {
    let topics = state
        .catalog
        .fetch_topics()
        .await
        .map_err(ApplicationError::from)?;
    Ok(Json(ApiResponse::success(topics)))
}

/// GET /api/topics/:topic_id - 获取单个主题
pub async fn get_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<Json<ApiResponse<Topic>>, ApiError> {
    let topic = state
        .catalog
        .fetch_topic(&topic_id)
        .await
        .map_err(ApplicationError::from)?;
    Ok(Json(ApiResponse::success(topic)))
}

/// GET /api/questions/topic/:topic_id - 获取主题下全部题目
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Question>>>, ApiError> {
    let questions = state
        .catalog
        .fetch_questions(&topic_id)
        .await
        .map_err(ApplicationError::from)?;
    Ok(Json(ApiResponse::success(questions)))
}
