//! Router for the stateless gateway API. Callers keep their own
//! transcript and send the relevant part of it with every request.

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::public;
use crate::ai::encoder::strip_data_uri;
use crate::ai::gateway::BoxedGateway;
use crate::ai::prompt::IMAGE_ANALYSIS_INSTRUCTION;
use crate::api::public::ApiError;
use crate::api::routes::UPLOAD_BODY_LIMIT;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

fn gateway(state: &SharedState) -> BoxedGateway {
    Arc::clone(&state.read().expect("Unable to read share state").gateway)
}

/// Analyze a base64 encoded image of ingredients
async fn analyze(
    State(state): State<SharedState>,
    Json(payload): Json<public::AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let image = strip_data_uri(&payload.image);
    if image.is_empty() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, "Missing image").into_response());
    }
    let instruction = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(IMAGE_ANALYSIS_INSTRUCTION);

    let message = gateway(&state).analyze_image(image, instruction).await?;

    Ok(Json(public::GatewayResponse::new(&message)).into_response())
}

/// Send a follow-up message along with the caller's recent history
async fn chat(
    State(state): State<SharedState>,
    Json(payload): Json<public::ChatRequest>,
) -> Result<Response, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, "Message is empty").into_response());
    }

    let reply = gateway(&state).chat(message, &payload.history).await?;

    Ok(Json(public::GatewayResponse::new(&reply)).into_response())
}

/// Create the gateway router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/analyze",
            post(analyze).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/chat", post(chat))
}
