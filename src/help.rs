//! The capture → OCR → advise pipeline, reduced to one remote call.
//!
//! The laptop-side client owns the screen capture, text extraction and the
//! coding-help model; this device only asks it for a speakable reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Help pipeline returned no reply text")]
    EmptyReply,
}

#[async_trait]
pub trait HelpPipeline: Send + Sync {
    /// Capture the developer's screen, extract the code, return advice.
    async fn request_help(&self) -> Result<String, HelpError>;
}

/// Reply document from the laptop client's help endpoint.
#[derive(Debug, Deserialize)]
struct HelpReply {
    response: Option<String>,
}

pub struct RemoteHelpClient {
    client: Client,
    url: String,
}

impl RemoteHelpClient {
    /// `timeout` should comfortably exceed the executor's enrichment bound;
    /// the executor owns the deadline, this is only a transport backstop.
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, url }
    }
}

#[async_trait]
impl HelpPipeline for RemoteHelpClient {
    async fn request_help(&self) -> Result<String, HelpError> {
        log::info!("Requesting help from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HelpError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: HelpReply = response.json().await?;
        reply
            .response
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(HelpError::EmptyReply)
    }
}
