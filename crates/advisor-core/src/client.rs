use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{ChatError, Result};
use crate::wire::ChatRequest;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sends one chat request to the worker.
///
/// An `Err` means the request never produced an HTTP response (connection
/// refused, DNS failure, timeout). Any response, whatever its status, is
/// returned as `Ok`.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<WorkerResponse>;
}

#[async_trait]
impl<T: CompletionTransport + ?Sized> CompletionTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<WorkerResponse> {
        (**self).send(request).await
    }
}

/// Body of a worker response, read at most once.
#[derive(Debug)]
pub enum ResponseBody {
    Live(reqwest::Response),
    /// Already buffered. `None` simulates a body that cannot be read.
    Buffered(Option<String>),
}

#[derive(Debug)]
pub struct WorkerResponse {
    pub status: u16,
    pub status_text: String,
    body: ResponseBody,
}

impl WorkerResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: ResponseBody) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body,
        }
    }

    /// A response with a fully buffered body and the canonical status text.
    pub fn buffered(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, reason_phrase(status), ResponseBody::Buffered(Some(body.into())))
    }

    /// A response whose body fails when read.
    pub fn unreadable(status: u16) -> Self {
        Self::new(status, reason_phrase(status), ResponseBody::Buffered(None))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub async fn read_text(self) -> Result<String> {
        match self.body {
            ResponseBody::Live(response) => Ok(response.text().await?),
            ResponseBody::Buffered(Some(text)) => Ok(text),
            ResponseBody::Buffered(None) => Err(ChatError::body_read("body is not readable")),
        }
    }
}

/// Canonical reason phrase for a status code, empty when there is none.
pub fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

/// HTTP transport to the worker endpoint.
#[derive(Clone)]
pub struct WorkerClient {
    client: Client,
    endpoint: String,
}

impl WorkerClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for WorkerClient {
    async fn send(&self, request: &ChatRequest) -> Result<WorkerResponse> {
        // No Authorization header: the worker holds the API key.
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        Ok(WorkerResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            ResponseBody::Live(response),
        ))
    }
}
