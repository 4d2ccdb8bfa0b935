use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::render_plain;
use crate::ai::chat::{AttachedImage, SessionBuilder};
use crate::ai::gateway::OpenAiGateway;
use crate::ai::prompt::SUGGESTED_QUESTIONS;
use crate::core::{AppConfig, init_tracing};

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Quit,
    Suggestions,
    Image(&'a str),
    Text(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line.split_once(char::is_whitespace) {
        Some(("/image", path)) => Input::Image(path.trim()),
        _ => match line {
            "/quit" | "/exit" => Input::Quit,
            "/suggestions" => Input::Suggestions,
            _ => Input::Text(line),
        },
    }
}

pub async fn run() -> Result<()> {
    // Keep the REPL readable; RUST_LOG can still turn logging up
    init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let session = SessionBuilder::new(Arc::new(OpenAiGateway::from_config(&config)))
        .timeout(config.request_timeout())
        .build();

    let mut rl = DefaultEditor::new()?;
    println!("Send a photo of your ingredients with /image <path>, or just ask a question.");
    println!("/suggestions lists ideas, /quit exits.");

    loop {
        let readline = rl.readline(">>> ");
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };
        let _ = rl.add_history_entry(line.as_str());

        let result = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Suggestions => {
                for question in SUGGESTED_QUESTIONS {
                    println!("  {}", question);
                }
                continue;
            }
            Input::Image(path) => {
                let image = AttachedImage::from_path(PathBuf::from(path));
                session.submit_image(image).await
            }
            Input::Text(text) => session.submit_text(text).await,
        };

        match result {
            Ok(reply) => println!("{}\n", render_plain(&reply.text)),
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}
