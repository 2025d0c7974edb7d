//! Backend speaking to a remote `memo-server` over its REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::Backend;
use crate::api::ApiResponse;
use crate::auth::API_KEY_HEADER;
use crate::errors::{AppError, ErrorResponse};
use crate::models::{
    AddTagRequest, CreateMemoRequest, DeleteMemoResponse, Memo, MemoId, Topic, TopicId,
};

/// Remote store client. Cheap to clone.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::BadRequest(format!("Invalid store URL {}: {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            base,
            api_key,
        })
    }

    /// Build `<base>/api/<segments...>`, percent-encoding every segment.
    fn url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::BadRequest(format!("Store URL {} cannot be a base", self.base)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = self.authorized(request).send().await?;
        if response.status().is_success() {
            let body: ApiResponse<T> = response.json().await?;
            Ok(body.data)
        } else {
            let status = response.status();
            match response.json::<ErrorResponse>().await {
                Ok(body) => Err(body.into()),
                Err(_) => Err(AppError::BackendUnavailable(format!(
                    "Store answered with status {}",
                    status
                ))),
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError> {
        let url = self.url(&["topics"])?;
        self.send(self.client.get(url).query(&[("keyword", keyword)]))
            .await
    }

    async fn get_memo(&self, topic_id: &TopicId, id: Option<&MemoId>) -> Result<Memo, AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "memo"])?;
        let mut request = self.client.get(url);
        if let Some(id) = id {
            request = request.query(&[("id", id.as_str())]);
        }
        self.send(request).await
    }

    async fn list_memos(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "memos"])?;
        self.send(self.client.get(url)).await
    }

    async fn create_memo(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "memos"])?;
        let body = CreateMemoRequest {
            content: content.to_string(),
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn delete_memo(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "memos", id.as_str()])?;
        let body: DeleteMemoResponse = self.send(self.client.delete(url)).await?;
        Ok(body.remaining)
    }

    async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "tags"])?;
        self.send(self.client.get(url)).await
    }

    async fn add_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "tags"])?;
        let body = AddTagRequest {
            tag: tag.to_string(),
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn remove_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        let url = self.url(&["topics", topic_id.as_str(), "tags", tag])?;
        self.send(self.client.delete(url)).await
    }
}
