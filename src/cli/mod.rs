use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod analyze;
pub mod chat;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Start an interactive recipe chat session
    Chat {},
    /// Suggest recipes for a photo of ingredients
    Analyze {
        /// Path to the image
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat {}) => {
            chat::run().await?;
        }
        Some(Command::Analyze { image }) => {
            analyze::run(image).await?;
        }
        None => {}
    }

    Ok(())
}

/// Terminal rendering of assistant text. Bold markers are dropped since
/// there is nothing to render them with.
pub(crate) fn render_plain(text: &str) -> String {
    text.replace("**", "")
}
