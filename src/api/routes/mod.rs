//! API routes module

pub mod gateway;
pub mod sessions;

use std::sync::{Arc, RwLock};

use crate::ai::encoder::MAX_IMAGE_BYTES;
use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

// Room for a max size image as base64 plus request overhead
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 1024 * 1024;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Session routes
        .nest("/sessions", sessions::router())
        // Stateless model gateway routes
        .nest("/gateway", gateway::router())
}
