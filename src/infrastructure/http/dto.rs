//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::domain::narration::NarrationMode;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Narration DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub topic_id: String,
}

fn default_start_number() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    /// 起始题号（1 起）
    #[serde(default = "default_start_number")]
    pub question_number: usize,
}

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub question_number: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: NarrationMode,
}

#[derive(Debug, Deserialize)]
pub struct SetRateRequest {
    pub rate: f32,
}

#[derive(Debug, Deserialize)]
pub struct SetAutoAdvanceRequest {
    pub enabled: bool,
}
