//! Router for the sessions API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response, sse::Event, sse::KeepAlive, sse::Sse},
    routing::{get, post},
};
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;

use super::public;
use crate::ai::chat::{AttachedImage, Session};
use crate::ai::encoder::MAX_IMAGE_BYTES;
use crate::ai::prompt::SUGGESTED_QUESTIONS;
use crate::api::public::ApiError;
use crate::api::routes::UPLOAD_BODY_LIMIT;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

fn find_session(state: &SharedState, id: &str) -> Option<Arc<Session>> {
    state
        .read()
        .expect("Unable to read share state")
        .session(id)
}

fn session_not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Session {} not found", id)).into_response()
}

/// Start a new session with an empty transcript
async fn create_session(State(state): State<SharedState>) -> impl IntoResponse {
    let session = state
        .write()
        .expect("Unable to write share state")
        .create_session();
    tracing::info!(session_id = %session.id, "Created session");

    (
        StatusCode::CREATED,
        Json(public::CreateSessionResponse {
            id: session.id.clone(),
        }),
    )
}

/// Get the transcript and pending flag of a session
async fn session_view(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let Some(session) = find_session(&state, &id) else {
        return session_not_found(&id);
    };

    Json(public::SessionResponse {
        id: session.id.clone(),
        pending: session.is_pending(),
        transcript: session.transcript(),
    })
    .into_response()
}

/// End a session, dropping its transcript
async fn end_session(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let removed = state
        .write()
        .expect("Unable to write share state")
        .end_session(&id);

    if removed {
        tracing::info!(session_id = %id, "Ended session");
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}

/// Send a follow-up message and wait for the reply
async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<public::MessageRequest>,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id) else {
        return Ok(session_not_found(&id));
    };

    // Spawned so that a client disconnect can't cancel the request
    // halfway and leave the session without its reply
    let entry =
        tokio::spawn(async move { session.submit_text(&payload.message).await }).await??;

    Ok(Json(public::EntryResponse { entry }).into_response())
}

/// Upload an image of ingredients and wait for recipe suggestions
async fn upload_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id) else {
        return Ok(session_not_found(&id));
    };

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Ok(e.into_response()),
        };
        if field.name() != Some("image") {
            continue;
        }

        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !media_type.starts_with("image/") {
            return Ok((
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Please select an image file.",
            )
                .into_response());
        }
        let file_name = field.file_name().map(str::to_string);

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(e.into_response()),
        };
        if bytes.len() > MAX_IMAGE_BYTES {
            return Ok((
                StatusCode::PAYLOAD_TOO_LARGE,
                "Image size must be less than 10MB.",
            )
                .into_response());
        }

        upload = Some(AttachedImage::from_upload(
            file_name,
            &media_type,
            bytes.to_vec(),
        ));
        break;
    }

    let Some(image) = upload else {
        return Ok((StatusCode::BAD_REQUEST, "Missing `image` field").into_response());
    };

    let entry = tokio::spawn(async move { session.submit_image(image).await }).await??;

    Ok(Json(public::EntryResponse { entry }).into_response())
}

/// Get the image attached to a user entry
async fn entry_image(
    State(state): State<SharedState>,
    Path((id, entry_id)): Path<(String, u64)>,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id) else {
        return Ok(session_not_found(&id));
    };
    let Some(image) = session.entry(entry_id).and_then(|e| e.attached_image) else {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Entry {} has no image", entry_id),
        )
            .into_response());
    };

    let bytes = image.blob.read().await?;

    Ok(([(header::CONTENT_TYPE, image.media_type)], bytes.to_vec()).into_response())
}

/// Stream every new transcript entry as a server sent event
async fn events(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let Some(session) = find_session(&state, &id) else {
        return session_not_found(&id);
    };

    // A lagging client skips the entries it missed; it can re-fetch the
    // whole transcript to catch up
    let stream = BroadcastStream::new(session.subscribe())
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let event = Event::default()
                .event("entry")
                .json_data(&entry)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
            Ok::<Event, Infallible>(event)
        });

    Sse::new(stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_secs(15)),
        )
        .into_response()
}

async fn suggestions() -> Json<public::SuggestionsResponse> {
    Json(public::SuggestionsResponse {
        suggestions: SUGGESTED_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    })
}

/// Create the sessions router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_session))
        .route("/suggestions", get(suggestions))
        .route("/{id}", get(session_view).delete(end_session))
        .route("/{id}/messages", post(send_message))
        .route(
            "/{id}/images",
            post(upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/{id}/images/{entry_id}", get(entry_image))
        .route("/{id}/events", get(events))
}
