use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

// A single part of a multi-part user turn:
//   {"type": "text", "text": "..."}
//   {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,..."}}
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: Content::Text(content.to_string()),
        }
    }

    pub fn new_with_parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Message {
            role,
            content: Content::Parts(parts),
        }
    }

    /// The plain text of the message. For multi-part content this is
    /// the first text part.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Failures talking to the chat completion API. Every variant is
/// terminal for the request that produced it; nothing is retried.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Chat completion API returned status {status}")]
    Status { status: u16 },

    #[error("Chat completion request timed out")]
    Timeout,

    #[error("Network error calling chat completion API: {0}")]
    Network(String),

    #[error("Invalid response from chat completion API: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// The upstream HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// Short machine readable cause.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Send a single chat completion request and return the raw JSON
/// response. Any non-2xx status is an error.
pub async fn completion(
    client: &reqwest::Client,
    request: &CompletionRequest,
    api_hostname: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Value, GatewayError> {
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        tracing::warn!(%status, %body, "Chat completion request failed");
        return Err(GatewayError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.json::<Value>().await?;
    Ok(body)
}

/// Text of the first choice, if there is any. Empty content counts as
/// missing.
pub fn completion_content(resp: &Value) -> Option<&str> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
}
