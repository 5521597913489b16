//! HTTP Catalog Client - 调用上游题库 HTTP 服务
//!
//! 实现 QuestionCatalogPort trait，通过 HTTP 读取上游题库
//!
//! 上游 API:
//! GET {base}/topics              -> [Topic]  (JSON)
//! GET {base}/topics/{id}         -> Topic
//! GET {base}/questions/topic/{topic_id} -> [Question]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::application::ports::{CatalogError, QuestionCatalogPort};
use crate::domain::question::{Question, Topic};

/// HTTP 题库客户端配置
#[derive(Debug, Clone)]
pub struct HttpCatalogClientConfig {
    /// 题库服务基础 URL（含 /api 前缀）
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpCatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpCatalogClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 题库客户端
pub struct HttpCatalogClient {
    client: Client,
    config: HttpCatalogClientConfig,
}

impl HttpCatalogClient {
    /// 创建新的 HTTP 题库客户端
    pub fn new(config: HttpCatalogClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        not_found_id: Option<&str>,
    ) -> Result<T, CatalogError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Fetching from catalog");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                CatalogError::Network(format!("Cannot connect to catalog service: {}", e))
            } else {
                CatalogError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found_id {
                return Err(CatalogError::TopicNotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl QuestionCatalogPort for HttpCatalogClient {
    async fn fetch_topics(&self) -> Result<Vec<Topic>, CatalogError> {
        self.get_json("topics", None).await
    }

    async fn fetch_topic(&self, topic_id: &str) -> Result<Topic, CatalogError> {
        self.get_json(&format!("topics/{}", topic_id), Some(topic_id))
            .await
    }

    async fn fetch_questions(&self, topic_id: &str) -> Result<Vec<Question>, CatalogError> {
        let questions: Vec<Question> = self
            .get_json(&format!("questions/topic/{}", topic_id), Some(topic_id))
            .await?;
        tracing::info!(
            topic_id = %topic_id,
            question_count = questions.len(),
            "Fetched questions from catalog"
        );
        Ok(questions)
    }
}
