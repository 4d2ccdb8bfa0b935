//! Public types for the sessions API
use serde::{Deserialize, Serialize};

use crate::ai::chat::TranscriptEntry;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub pending: bool,
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// The assistant entry that resolved a submission
#[derive(Serialize)]
pub struct EntryResponse {
    pub entry: TranscriptEntry,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}
