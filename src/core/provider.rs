//! The completion provider seam.
//!
//! [`CompletionProvider`] is the single operation the rest of the crate
//! needs from a hosted model: take a request, return text and usage.
//! [`OpenAiProvider`] implements it against an OpenAI-compatible
//! `chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::error::Error;
use std::fmt;
use tracing::{debug, warn};

use crate::api::{ChatCompletionResponse, ChatRequest};
use crate::core::message::Usage;
use crate::core::provider_slot::{Credential, CredentialError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The text and token usage of one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug)]
pub enum ProviderError {
    /// The request never produced an HTTP response.
    Transport(reqwest::Error),
    /// The provider answered with a non-success status.
    Status { status: u16, message: String },
    /// The response body was not a completion.
    Decode(String),
    /// The completion carried no choices.
    EmptyResponse,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(err) => write!(f, "Request to provider failed: {err}"),
            ProviderError::Status { status, message } => {
                write!(f, "API request failed with status {status}: {message}")
            }
            ProviderError::Decode(detail) => {
                write!(f, "Could not decode provider response: {detail}")
            }
            ProviderError::EmptyResponse => write!(f, "Provider returned no choices"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProviderError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, ProviderError>;
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(credential: &Credential, base_url: &str) -> Result<Self, CredentialError> {
        let token = credential.expose().trim();
        if token.is_empty() {
            return Err(CredentialError::Missing);
        }

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CredentialError::Malformed)?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(CredentialError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, ProviderError> {
        let url = chat_completions_url(&self.base_url);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(ProviderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(status = status.as_u16(), "completion request rejected");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: format_api_error(&error_text),
            });
        }

        let body = response.text().await.map_err(ProviderError::Transport)?;
        let completion = parse_completion(&body)?;
        debug!(usage = ?completion.usage, "completion received");
        Ok(completion)
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Reads the first choice and the usage block out of a completion body.
pub fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Decode(err.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    Ok(Completion {
        content: choice.message.content.unwrap_or_default(),
        usage: response.usage.map(|usage| {
            Usage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens,
            )
        }),
    })
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Condenses an error body into one readable line.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
        return json_value.to_string();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
