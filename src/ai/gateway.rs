//! The narrow client the session talks to. Two request shapes exist:
//! a single-turn image analysis and a text follow-up that replays
//! recent conversation context.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::{
    CHAT_FALLBACK, IMAGE_ANALYSIS_FALLBACK, IMAGE_ANALYSIS_SYSTEM_PROMPT,
    RECIPE_CHAT_SYSTEM_PROMPT,
};
use crate::core::AppConfig;
use crate::openai::{
    CompletionRequest, ContentPart, GatewayError, ImageUrl, Message, Role, completion,
    completion_content,
};

/// Number of trailing history entries replayed as context for a chat
/// request.
pub const CONTEXT_WINDOW: usize = 10;

const IMAGE_ANALYSIS_MAX_TOKENS: u32 = 1000;
const CHAT_MAX_TOKENS: u32 = 800;
const TEMPERATURE: f64 = 0.7;

/// A prior conversation entry as supplied by a caller. `kind` is the
/// role tag: `"user"` or `"bot"`. Entries with any other tag are not
/// replayed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContextMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl ContextMessage {
    pub fn new(kind: &str, content: &str) -> Self {
        Self {
            kind: kind.to_string(),
            content: content.to_string(),
        }
    }
}

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Ask the model to analyze an image. `base64_image` carries no
    /// data URI prefix.
    async fn analyze_image(
        &self,
        base64_image: &str,
        instruction: &str,
    ) -> Result<String, GatewayError>;

    /// Send a follow-up message with up to the last `CONTEXT_WINDOW`
    /// entries of `recent_history` as context.
    async fn chat(
        &self,
        user_text: &str,
        recent_history: &[ContextMessage],
    ) -> Result<String, GatewayError>;
}

pub type BoxedGateway = Arc<dyn ModelGateway>;

/// Translate the tail of `history` into chat turns. The window is taken
/// first and unknown role tags are dropped afterwards, so dropped
/// entries are not backfilled from older history.
pub fn context_messages(history: &[ContextMessage]) -> Vec<Message> {
    let start = history.len().saturating_sub(CONTEXT_WINDOW);
    history[start..]
        .iter()
        .filter_map(|entry| match entry.kind.as_str() {
            "user" => Some(Message::new(Role::User, &entry.content)),
            "bot" => Some(Message::new(Role::Assistant, &entry.content)),
            _ => None,
        })
        .collect()
}

pub fn image_analysis_messages(base64_image: &str, instruction: &str) -> Vec<Message> {
    vec![
        Message::new(Role::System, IMAGE_ANALYSIS_SYSTEM_PROMPT),
        Message::new_with_parts(
            Role::User,
            vec![
                ContentPart::Text {
                    text: instruction.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{}", base64_image),
                    },
                },
            ],
        ),
    ]
}

pub fn chat_messages(user_text: &str, recent_history: &[ContextMessage]) -> Vec<Message> {
    let mut messages = vec![Message::new(Role::System, RECIPE_CHAT_SYSTEM_PROMPT)];
    messages.extend(context_messages(recent_history));
    messages.push(Message::new(Role::User, user_text));
    messages
}

/// `ModelGateway` backed by an OpenAI compatible chat completion API.
/// This is the only place the API key is used.
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
            config.request_timeout(),
        )
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        max_tokens: u32,
        fallback: &str,
    ) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: TEMPERATURE,
        };
        let resp = completion(
            &self.client,
            &request,
            &self.api_hostname,
            &self.api_key,
            self.timeout,
        )
        .await?;

        match completion_content(&resp) {
            Some(content) => Ok(content.to_string()),
            None => {
                tracing::warn!("Completion had no content, using fallback. Resp: {}", resp);
                Ok(fallback.to_string())
            }
        }
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn analyze_image(
        &self,
        base64_image: &str,
        instruction: &str,
    ) -> Result<String, GatewayError> {
        let messages = image_analysis_messages(base64_image, instruction);
        self.complete(messages, IMAGE_ANALYSIS_MAX_TOKENS, IMAGE_ANALYSIS_FALLBACK)
            .await
    }

    async fn chat(
        &self,
        user_text: &str,
        recent_history: &[ContextMessage],
    ) -> Result<String, GatewayError> {
        let messages = chat_messages(user_text, recent_history);
        self.complete(messages, CHAT_MAX_TOKENS, CHAT_FALLBACK).await
    }
}
