use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;

use crate::api::{ChatChunk, ChatMessage, ChatRequest};

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

/// Handle one newline-delimited JSON line from the response body.
///
/// Returns `true` when the stream is finished. Lines that do not parse are
/// skipped without aborting the stream; the server occasionally interleaves
/// keep-alive noise with real chunks.
fn process_stream_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if line.is_empty() {
        return false;
    }

    let chunk: ChatChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(_) => return false,
    };

    if let Some(message) = chunk.message {
        if !message.content.is_empty() {
            let _ = tx.send((StreamMessage::Chunk(message.content), stream_id));
        }
    }

    if chunk.done {
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    false
}

fn chat_url(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawn one task that posts the request and forwards stream updates
    /// over the channel. The task never touches UI state; the event loop
    /// drains the channel on its own side. Once started it runs to
    /// completion or failure; there is no cancellation.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                model,
                api_messages,
                stream_id,
            } = params;

            let request = ChatRequest {
                model,
                messages: api_messages,
                stream: true,
            };

            let response = match client
                .post(chat_url(&base_url))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx.send((StreamMessage::Error(e.to_string()), stream_id));
                    let _ = tx.send((StreamMessage::End, stream_id));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let _ = tx.send((
                    StreamMessage::Error(format!("Server error ({}): {}", status, body.trim())),
                    stream_id,
                ));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk_bytes) => {
                        buffer.extend_from_slice(&chunk_bytes);

                        while let Some(newline_pos) = memchr(b'\n', &buffer) {
                            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                                Ok(s) => s.trim().to_string(),
                                Err(e) => {
                                    tracing::warn!("invalid UTF-8 in stream: {e}");
                                    buffer.drain(..=newline_pos);
                                    continue;
                                }
                            };

                            let finished = process_stream_line(&line, &tx, stream_id);
                            buffer.drain(..=newline_pos);
                            if finished {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send((StreamMessage::Error(e.to_string()), stream_id));
                        let _ = tx.send((StreamMessage::End, stream_id));
                        return;
                    }
                }
            }

            // Server closed the connection without a done marker.
            let _ = tx.send((StreamMessage::End, stream_id));
        });
    }

}
