//! Streaming chat completion clients.
//!
//! The [`ChatModel`] trait models the completion service as a producer of a
//! finite, non-restartable token sequence: the receiver yields text fragments
//! until the upstream stream closes or errors, and dropping the receiver
//! releases the underlying connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::message::Message;
use crate::types::AssistantError;

/// Lazy sequence of answer fragments produced by a completion stream.
pub type TokenReceiver = mpsc::Receiver<Result<String, AssistantError>>;

/// A streaming chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Starts a completion over `messages` and returns the token stream.
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenReceiver, AssistantError>;
}

/// Chat completion client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    /// Builds a client against `{base_url}/chat/completions`.
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenReceiver, AssistantError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AssistantError::Completion(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %detail, "completion request rejected");
            return Err(AssistantError::Completion(format!(
                "completion request failed with status {status}"
            )));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            // SSE lines can straddle body chunks; buffer until a newline.
            let mut pending = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        pending.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(pos) = pending.find('\n') {
                            let line: String = pending.drain(..=pos).collect();
                            match parse_stream_line(line.trim()) {
                                StreamEvent::Token(token) => {
                                    if tx.send(Ok(token)).await.is_err() {
                                        // Receiver dropped; stop consuming.
                                        return;
                                    }
                                }
                                StreamEvent::Done => return,
                                StreamEvent::Ignore => {}
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx
                            .send(Err(AssistantError::Completion(err.to_string())))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

enum StreamEvent {
    Token(String),
    Done,
    Ignore,
}

/// Parses one SSE line of an OpenAI-compatible completion stream.
fn parse_stream_line(line: &str) -> StreamEvent {
    let Some(rest) = line.strip_prefix("data:") else {
        return StreamEvent::Ignore;
    };
    let data = rest.trim_start();
    if data == "[DONE]" {
        return StreamEvent::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return StreamEvent::Ignore;
    };
    match value["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => StreamEvent::Token(content.to_string()),
        _ => StreamEvent::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delta_content_tokens() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert!(matches!(
            parse_stream_line(line),
            StreamEvent::Token(token) if token == "Hel"
        ));
    }

    #[test]
    fn done_marker_terminates_the_stream() {
        assert!(matches!(parse_stream_line("data: [DONE]"), StreamEvent::Done));
    }

    #[test]
    fn non_data_and_empty_delta_lines_are_ignored() {
        assert!(matches!(parse_stream_line(""), StreamEvent::Ignore));
        assert!(matches!(parse_stream_line(": keepalive"), StreamEvent::Ignore));
        assert!(matches!(
            parse_stream_line(r#"data: {"choices":[{"delta":{}}]}"#),
            StreamEvent::Ignore
        ));
        assert!(matches!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            StreamEvent::Ignore
        ));
    }
}
