use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::render_plain;
use crate::ai::chat::{AttachedImage, SessionBuilder};
use crate::ai::gateway::OpenAiGateway;
use crate::core::{AppConfig, init_tracing};

pub async fn run(image: PathBuf) -> Result<()> {
    init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let session = SessionBuilder::new(Arc::new(OpenAiGateway::from_config(&config)))
        .timeout(config.request_timeout())
        .build();

    let reply = session
        .submit_image(AttachedImage::from_path(image))
        .await?;
    println!("{}", render_plain(&reply.text));

    Ok(())
}
