//! Shared test doubles for cross-component tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dronemind::completion::{ChatModel, TokenReceiver};
use dronemind::message::Message;
use dronemind::types::AssistantError;
use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};
use tokio::sync::mpsc;

/// Maps every text to the same vector, so any stored chunk is a perfect
/// similarity match for any question.
#[derive(Clone)]
pub struct ConstEmbedder {
    ndims: usize,
}

impl ConstEmbedder {
    pub fn new(ndims: usize) -> Self {
        Self { ndims }
    }
}

impl EmbeddingModel for ConstEmbedder {
    const MAX_DOCUMENTS: usize = 64;

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let docs: Vec<String> = texts.into_iter().collect();
        let ndims = self.ndims;
        async move {
            Ok(docs
                .into_iter()
                .map(|document| Embedding {
                    vec: vec![0.5; ndims],
                    document,
                })
                .collect())
        }
    }
}

/// Completion double that records the messages it was handed and streams a
/// scripted token sequence.
#[derive(Clone)]
pub struct ScriptedChatModel {
    tokens: Vec<String>,
    seen: Arc<Mutex<Vec<Message>>>,
}

impl ScriptedChatModel {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|token| token.to_string()).collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The messages passed to the most recent `stream_chat` call.
    pub fn seen_messages(&self) -> Vec<Message> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenReceiver, AssistantError> {
        *self.seen.lock().unwrap() = messages.to_vec();
        let (tx, rx) = mpsc::channel(self.tokens.len().max(1));
        for token in &self.tokens {
            tx.send(Ok(token.clone()))
                .await
                .map_err(|_| AssistantError::Completion("receiver closed".to_string()))?;
        }
        Ok(rx)
    }
}

/// Completion double that fails partway through its answer.
#[derive(Clone)]
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn stream_chat(&self, _messages: &[Message]) -> Result<TokenReceiver, AssistantError> {
        let (tx, rx) = mpsc::channel(2);
        let _ = tx.send(Ok("partial".to_string())).await;
        let _ = tx
            .send(Err(AssistantError::Completion(
                "upstream stream closed unexpectedly".to_string(),
            )))
            .await;
        Ok(rx)
    }
}
