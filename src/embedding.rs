//! Embedding model implementations.
//!
//! Both types implement rig-core's [`EmbeddingModel`] trait, which is what
//! the vector store and the query service are generic over: a production
//! client for OpenAI-compatible `/embeddings` endpoints and a deterministic
//! hash-based mock for tests and offline runs.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};
use serde::{Deserialize, Serialize};

use crate::retry::{RetryPolicy, retry};
use crate::types::AssistantError;

/// Embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    ndims: usize,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    /// Builds a new embeddings client against `{base_url}/embeddings`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        ndims: usize,
    ) -> Result<Self, AssistantError> {
        if api_key.trim().is_empty() {
            return Err(AssistantError::Config(
                "embedding API key is empty".to_string(),
            ));
        }
        if model.trim().is_empty() {
            return Err(AssistantError::Config(
                "embedding model name is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|err| AssistantError::Config(format!("invalid API key: {err}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|err| AssistantError::Config(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            ndims,
            retry: RetryPolicy::linear(3, Duration::from_millis(500)),
        })
    }

    /// Overrides the default retry schedule.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

impl EmbeddingModel for OpenAiEmbedder {
    const MAX_DOCUMENTS: usize = 64;

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let inputs: Vec<String> = texts.into_iter().collect();
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let model = self.model.clone();
        let policy = self.retry.clone();
        let ndims = self.ndims;

        async move {
            if inputs.is_empty() {
                return Ok(Vec::new());
            }

            let vectors = request_embeddings(&client, &endpoint, &model, &policy, &inputs)
                .await
                .map_err(EmbeddingError::ProviderError)?;

            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::ResponseError(format!(
                    "service returned {} embeddings for {} inputs",
                    vectors.len(),
                    inputs.len()
                )));
            }

            inputs
                .into_iter()
                .zip(vectors)
                .map(|(document, vec)| {
                    if vec.len() != ndims {
                        return Err(EmbeddingError::ResponseError(format!(
                            "expected {ndims}-dimensional vector, got {}",
                            vec.len()
                        )));
                    }
                    Ok(Embedding { document, vec })
                })
                .collect()
        }
    }
}

async fn request_embeddings(
    client: &Client,
    endpoint: &str,
    model: &str,
    policy: &RetryPolicy,
    inputs: &[String],
) -> Result<Vec<Vec<f64>>, String> {
    let mut parsed: EmbeddingResponse = retry(policy, "embeddings request", |_| {
        let request = EmbeddingRequest { model, input: inputs };
        async move {
            let response = client
                .post(endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|err| err.to_string())?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!("embeddings request failed ({status}): {body}"));
            }
            response.json().await.map_err(|err| err.to_string())
        }
    })
    .await?;

    parsed.data.sort_by_key(|entry| entry.index);
    Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    index: usize,
}

/// Deterministic hash-based embedder for tests and offline runs.
///
/// The same text always maps to the same vector; different texts almost
/// always differ. The vectors carry no semantic signal.
#[derive(Clone, Debug)]
pub struct MockEmbedder {
    ndims: usize,
}

impl MockEmbedder {
    pub fn new(ndims: usize) -> Self {
        Self { ndims }
    }
}

impl EmbeddingModel for MockEmbedder {
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
                    vec: hash_to_vec(&document, ndims),
                    document,
                })
                .collect())
        }
    }
}

fn hash_to_vec(text: &str, ndims: usize) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..ndims)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f64) / u32::MAX as f64
        })
        .collect()
}
