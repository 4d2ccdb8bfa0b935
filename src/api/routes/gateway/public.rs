//! Public types for the stateless gateway API
use serde::{Deserialize, Serialize};

use crate::ai::gateway::ContextMessage;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    // Base64, with or without a `data:` URI prefix
    pub image: String,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ContextMessage>,
}

#[derive(Serialize)]
pub struct GatewayResponse {
    message: String,
}

impl GatewayResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.into(),
        }
    }
}
