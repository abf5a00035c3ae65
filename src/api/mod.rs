use serde::{Deserialize, Serialize};

#[derive(Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// One line of the server's newline-delimited streaming response.
///
/// Every field is optional on the wire; lines that fail to deserialize
/// entirely are skipped by the stream reader.
#[derive(Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatChunkMessage>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Deserialize)]
pub struct ChatChunkMessage {
    #[serde(default)]
    pub content: String,
}
