//! 应用层错误定义

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效（当前生命周期状态下不允许该命令）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 上游题库获取失败
    #[error("Upstream fetch failure: {0}")]
    UpstreamFetchFailure(String),

    /// 语音能力不可用
    #[error("Speech capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::CatalogError> for ApplicationError {
    fn from(err: crate::application::ports::CatalogError) -> Self {
        use crate::application::ports::CatalogError;
        match err {
            CatalogError::TopicNotFound(id) => Self::not_found("Topic", id),
            other => Self::UpstreamFetchFailure(other.to_string()),
        }
    }
}
