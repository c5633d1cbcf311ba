use async_trait::async_trait;
use futures::TryStreamExt;
use lexbrief_core::{ServerInfo, SummarizeRequest, SummaryResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};

use crate::{ServiceError, SummarizeService, SummaryReply};

const EVENT_STREAM: &str = "text/event-stream";

/// Async HTTP client for the summarization backend.
#[derive(Debug, Clone)]
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Status(resp.status().as_u16()))
        }
    }

    /// Fetch the provider name and upload limits the server advertises.
    pub async fn server_info(&self) -> Result<ServerInfo, ServiceError> {
        let resp = self
            .client
            .get(format!("{}/config", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status(resp.status().as_u16()));
        }
        resp.json::<ServerInfo>()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("json decode: {e}")))
    }

    async fn build_form(request: &SummarizeRequest) -> Result<Form, ServiceError> {
        let mut form = Form::new();
        if let Some(att) = &request.attachment {
            let bytes = tokio::fs::read(&att.path)
                .await
                .map_err(|e| ServiceError::Attachment(format!("{}: {e}", att.name)))?;
            let part = Part::bytes(bytes)
                .file_name(att.name.clone())
                .mime_str(att.kind.mime_type())
                .map_err(|e| ServiceError::Attachment(e.to_string()))?;
            form = form.part("file", part);
        }
        if let Some(text) = &request.main_content {
            form = form.text("main_content", text.clone());
        }
        Ok(form.text("max_length", request.max_length.to_string()))
    }
}

fn is_event_stream(resp: &Response) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(EVENT_STREAM))
}

#[async_trait]
impl SummarizeService for HttpService {
    async fn summarize(&self, request: &SummarizeRequest) -> Result<SummaryReply, ServiceError> {
        let form = Self::build_form(request).await?;
        info!(
            has_file = request.attachment.is_some(),
            has_text = request.main_content.is_some(),
            max_length = request.max_length,
            "submitting document for summary"
        );

        let resp = self
            .client
            .post(format!("{}/summarize", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        if is_event_stream(&resp) {
            debug!("backend replied with an event stream");
            let body = resp
                .bytes_stream()
                .map_err(|e| ServiceError::Connection(e.to_string()));
            Ok(SummaryReply::Stream(Box::pin(body)))
        } else {
            let result = resp
                .json::<SummaryResult>()
                .await
                .map_err(|e| ServiceError::InvalidResponse(format!("json decode: {e}")))?;
            Ok(SummaryReply::Json(result))
        }
    }
}
