use clap::Parser;
use std::error::Error;
use tracing_subscriber::EnvFilter;

use chatbox::core::constants::{DEFAULT_BASE_URL, SUPPORTED_MODELS};

#[derive(Parser)]
#[command(name = "chatbox")]
#[command(about = "A terminal chat interface for a local Ollama server")]
#[command(long_about = "Chatbox is a full-screen terminal chat interface that connects to a \
locally hosted Ollama server for real-time streaming conversations.\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Tab               Switch between the message and system-prompt fields\n\
  F2 / F3 / F4      Cycle appearance, color theme, and model\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+C            Quit the application")]
struct Args {
    #[arg(
        short,
        long,
        default_value = "mistral",
        help = "Model to chat with (mistral, phi, llama2, gemma)"
    )]
    model: String,

    #[arg(
        long,
        default_value = DEFAULT_BASE_URL,
        help = "Base URL of the Ollama server"
    )]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if !SUPPORTED_MODELS.contains(&args.model.as_str()) {
        eprintln!(
            "Unknown model '{}'. Supported models: {}",
            args.model,
            SUPPORTED_MODELS.join(", ")
        );
        std::process::exit(1);
    }

    chatbox::ui::chat_loop::run_chat(args.model, args.base_url).await
}
