//! HTTP surface: the streaming chat endpoint and a health check.
//!
//! `POST /api/chat` takes the conversation as JSON and answers with a
//! Server-Sent Events stream of answer fragments. Failures before the first
//! token produce a 500 with a JSON error body; failures mid-stream emit one
//! `error` event and close. The user-facing message is always generic; full
//! diagnostic detail stays in the server log.

use std::convert::Infallible;
use std::sync::Arc;

use async_stream::stream;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rig::embeddings::EmbeddingModel;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::completion::ChatModel;
use crate::message::Message;
use crate::query::ChatService;
use crate::stores::KnowledgeStore;

/// What the end user sees when any step fails.
const USER_FACING_ERROR: &str = "Something went wrong, please retry.";

/// Request body of the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Builds the application router around a shared chat service.
pub fn router<E, S, C>(service: Arc<ChatService<E, S, C>>) -> Router
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    S: KnowledgeStore + 'static,
    C: ChatModel + 'static,
{
    Router::new()
        .route("/api/chat", post(chat::<E, S, C>))
        .route("/healthz", get(healthz))
        .with_state(service)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn chat<E, S, C>(
    State(service): State<Arc<ChatService<E, S, C>>>,
    Json(request): Json<ChatRequest>,
) -> Response
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    S: KnowledgeStore + 'static,
    C: ChatModel + 'static,
{
    let mut tokens = match service.answer(request.messages).await {
        Ok(receiver) => receiver,
        Err(err) => {
            error!(%err, "chat request failed before streaming");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": USER_FACING_ERROR })),
            )
                .into_response();
        }
    };

    // Dropping this stream on client disconnect drops the receiver, which
    // stops the completion forwarder and releases the upstream connection.
    let sse_stream = stream! {
        while let Some(item) = tokens.recv().await {
            match item {
                Ok(token) => yield Ok::<_, Infallible>(SseEvent::default().data(token)),
                Err(err) => {
                    error!(%err, "completion stream failed mid-answer");
                    yield Ok(SseEvent::default().event("error").data(USER_FACING_ERROR));
                    break;
                }
            }
        }
    };

    Sse::new(sse_stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
