//! Retrieval-augmented query service.
//!
//! Per request: extract the latest question, embed a normalized copy,
//! retrieve the top-K similar chunks, assemble the system instruction and
//! hand the conversation to the streaming completion backend. The service
//! holds no per-request state; concurrent requests share only the read-only
//! store and the stateless clients.

pub mod normalize;
pub mod prompt;

use rig::embeddings::EmbeddingModel;
use tracing::debug;

use crate::completion::{ChatModel, TokenReceiver};
use crate::message::Message;
use crate::stores::KnowledgeStore;
use crate::types::AssistantError;

/// Retrieval tuning for the query side.
#[derive(Clone, Copy, Debug)]
pub struct RetrievalConfig {
    /// Minimum similarity for a chunk to enter the context, in [0, 1].
    pub match_threshold: f32,
    /// Maximum number of chunks in the context.
    pub match_count: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.2,
            match_count: 3,
        }
    }
}

/// The retrieval-augmented chat service. Dependencies are injected
/// explicitly so every collaborator can be a test double.
pub struct ChatService<E, S, C> {
    embedder: E,
    store: S,
    chat_model: C,
    retrieval: RetrievalConfig,
}

impl<E, S, C> ChatService<E, S, C>
where
    E: EmbeddingModel + Clone + Send + Sync,
    S: KnowledgeStore,
    C: ChatModel,
{
    pub fn new(embedder: E, store: S, chat_model: C, retrieval: RetrievalConfig) -> Self {
        Self {
            embedder,
            store,
            chat_model,
            retrieval,
        }
    }

    /// Answers the conversation's latest question with a streamed completion
    /// conditioned on retrieved knowledge-base chunks.
    ///
    /// No retries happen at this layer; any step's failure is returned to
    /// the caller. An empty retrieval result is not a failure.
    pub async fn answer(&self, conversation: Vec<Message>) -> Result<TokenReceiver, AssistantError> {
        let question = latest_question(&conversation)?;

        // The canonical-model-name rewrite only feeds the embedding; the
        // prompt below carries the question verbatim.
        let normalized = normalize::normalize_model_names(&question);
        let embedding = self
            .embedder
            .embed_texts(vec![normalized])
            .await
            .map_err(|err| AssistantError::Embedding(err.to_string()))?
            .pop()
            .ok_or_else(|| {
                AssistantError::Embedding("embedding service returned no vector".to_string())
            })?;
        let query_vector: Vec<f32> = embedding.vec.iter().map(|v| *v as f32).collect();

        let chunks = self
            .store
            .search_similar(
                &query_vector,
                self.retrieval.match_threshold,
                self.retrieval.match_count,
            )
            .await?;
        debug!(
            retrieved = chunks.len(),
            threshold = self.retrieval.match_threshold,
            "assembled retrieval context"
        );

        let context = prompt::format_context(&chunks);
        let system = Message::system(&prompt::system_instruction(&context, &question));

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(system);
        messages.extend(conversation);

        self.chat_model.stream_chat(&messages).await
    }
}

fn latest_question(conversation: &[Message]) -> Result<String, AssistantError> {
    let last = conversation
        .last()
        .ok_or_else(|| AssistantError::InvalidInput("conversation is empty".to_string()))?;
    let question = last.content.trim();
    if question.is_empty() {
        return Err(AssistantError::InvalidInput(
            "latest message has no content".to_string(),
        ));
    }
    Ok(question.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_question_takes_the_last_message() {
        let conversation = vec![
            Message::user("first"),
            Message::assistant("answer"),
            Message::user("  second  "),
        ];
        assert_eq!(latest_question(&conversation).unwrap(), "second");
    }

    #[test]
    fn empty_conversation_is_invalid_input() {
        assert!(matches!(
            latest_question(&[]),
            Err(AssistantError::InvalidInput(_))
        ));
    }

    #[test]
    fn blank_latest_message_is_invalid_input() {
        let conversation = vec![Message::user("   ")];
        assert!(matches!(
            latest_question(&conversation),
            Err(AssistantError::InvalidInput(_))
        ));
    }
}
