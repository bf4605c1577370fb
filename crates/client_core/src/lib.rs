use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use shared::{
    domain::{ConversationEntry, Module, ModuleDetail, ModuleId},
    error::ApiError,
    protocol::{
        AskRequest, AskResponse, ConversationsResponse, HealthResponse, ModulesResponse,
        UploadResponse,
    },
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout unless configured; a hung request then never completes.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api base url '{0}' cannot carry a path")]
    UnsupportedBaseUrl(String),
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("server did not confirm {operation}")]
    Rejected { operation: &'static str },
}

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(err) => err.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub module_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The backend's HTTP contract. Every call is a single request; callers own
/// sequencing, invalidation and retries (there are none).
#[async_trait]
pub trait StudyApi: Send + Sync {
    async fn list_modules(&self) -> Result<Vec<Module>, TransportError>;
    async fn upload_module(&self, upload: UploadRequest) -> Result<UploadResponse, TransportError>;
    async fn delete_module(&self, module_id: ModuleId) -> Result<(), TransportError>;
    async fn list_conversations(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ConversationEntry>, TransportError>;
    async fn ask(&self, module_id: ModuleId, question: &str)
        -> Result<AskResponse, TransportError>;
    async fn health(&self) -> Result<HealthResponse, TransportError>;
    async fn module_detail(&self, module_id: ModuleId) -> Result<ModuleDetail, TransportError>;
}

pub struct StudyClient {
    http: Client,
    base_url: Url,
}

impl StudyClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::UnsupportedBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, TransportError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|source| TransportError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(TransportError::UnsupportedBaseUrl(raw.to_string()));
    }
    Ok(url)
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = ApiError::message_from_body(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(TransportError::Status { status, message })
}

#[async_trait]
impl StudyApi for StudyClient {
    async fn list_modules(&self) -> Result<Vec<Module>, TransportError> {
        let response = self
            .http
            .get(self.endpoint(&["modules"])?)
            .send()
            .await?;
        let body: ModulesResponse = ensure_success(response).await?.json().await?;
        debug!(count = body.modules.len(), "api: modules listed");
        Ok(body.modules)
    }

    async fn upload_module(&self, upload: UploadRequest) -> Result<UploadResponse, TransportError> {
        let size_bytes = upload.bytes.len();
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("module_name", upload.module_name.clone());

        let response = self
            .http
            .post(self.endpoint(&["upload"])?)
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = ensure_success(response).await?.json().await?;
        if !body.success {
            return Err(TransportError::Rejected { operation: "upload" });
        }
        info!(
            file_name = %upload.file_name,
            module_name = %upload.module_name,
            size_bytes,
            "api: module uploaded"
        );
        Ok(body)
    }

    async fn delete_module(&self, module_id: ModuleId) -> Result<(), TransportError> {
        let response = self
            .http
            .delete(self.endpoint(&["modules", &module_id.to_string()])?)
            .send()
            .await?;
        ensure_success(response).await?;
        info!(module_id = module_id.0, "api: module deleted");
        Ok(())
    }

    async fn list_conversations(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ConversationEntry>, TransportError> {
        let response = self
            .http
            .get(self.endpoint(&["conversations", &module_id.to_string()])?)
            .send()
            .await?;
        let body: ConversationsResponse = ensure_success(response).await?.json().await?;
        debug!(
            module_id = module_id.0,
            count = body.conversations.len(),
            "api: conversations listed"
        );
        Ok(body.conversations)
    }

    async fn ask(
        &self,
        module_id: ModuleId,
        question: &str,
    ) -> Result<AskResponse, TransportError> {
        let response = self
            .http
            .post(self.endpoint(&["ask"])?)
            .json(&AskRequest {
                pdf_id: module_id,
                question: question.to_string(),
            })
            .send()
            .await?;
        let body: AskResponse = ensure_success(response).await?.json().await?;
        if !body.success {
            return Err(TransportError::Rejected { operation: "ask" });
        }
        info!(module_id = module_id.0, "api: question answered");
        Ok(body)
    }

    async fn health(&self) -> Result<HealthResponse, TransportError> {
        let response = self
            .http
            .get(self.endpoint(&["health"])?)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn module_detail(&self, module_id: ModuleId) -> Result<ModuleDetail, TransportError> {
        let response = self
            .http
            .get(self.endpoint(&["modules", &module_id.to_string()])?)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
