use std::sync::{Arc, RwLock};

use anyhow::Result;
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::api::state::AppState;
use crate::core::{AppConfig, init_tracing};

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    let cors = CorsLayer::permissive();
    let web_ui_path = shared_state
        .read()
        .expect("Unable to read share state")
        .config
        .web_ui_path
        .clone();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        // Static server of the chat UI assets
        .fallback_service(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(
                    ServeDir::new(web_ui_path)
                        .precompressed_br()
                        .precompressed_gzip(),
                ),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    // axum logs rejections from built-in extractors with the `axum::rejection`
    // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
    init_tracing(&format!(
        "{}=debug,tower_http=debug,axum::rejection=trace",
        env!("CARGO_CRATE_NAME")
    ));

    tracing::info!(
        model = %config.openai_model,
        api_hostname = %config.openai_api_hostname,
        timeout_secs = config.request_timeout_secs,
        "Using chat completion API"
    );

    let session_idle = config.session_idle();
    let app_state = AppState::new(config);
    let shared_state = Arc::new(RwLock::new(app_state));

    // Sessions are also dropped on creation; this catches the ones left
    // behind when nobody starts a new session
    let sweep_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(session_idle);
        loop {
            interval.tick().await;
            sweep_state
                .write()
                .expect("Unable to write share state")
                .evict_idle(session_idle);
        }
    });
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
