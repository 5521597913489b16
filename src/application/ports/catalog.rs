//! Question Catalog Port - 上游题库 API 抽象
//!
//! 题库 CRUD 属于外部协作方，本系统只读消费其 JSON 契约

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::question::{Question, Topic};

/// 题库访问错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Question Catalog Port
///
/// 上游题库服务的抽象接口
#[async_trait]
pub trait QuestionCatalogPort: Send + Sync {
    /// 列出全部主题
    async fn fetch_topics(&self) -> Result<Vec<Topic>, CatalogError>;

    /// 获取单个主题
    async fn fetch_topic(&self, topic_id: &str) -> Result<Topic, CatalogError>;

    /// 获取主题下的全部题目（按题库顺序）
    async fn fetch_questions(&self, topic_id: &str) -> Result<Vec<Question>, CatalogError>;
}
