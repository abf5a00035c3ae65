//! Chatbox is a terminal chat client for a locally hosted Ollama server.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the conversation history, the streaming
//!   orchestration, settings persistence, and the plaintext chat log.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`api`] defines the request and stream-chunk payloads exchanged with
//!   the server's chat endpoint.
//!
//! The runtime entrypoint lives in the binary crate (`src/main.rs`), which
//! parses the CLI and dispatches into [`ui::chat_loop`] for the interactive
//! session.

pub mod api;
pub mod core;
pub mod ui;
