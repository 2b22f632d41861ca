//! Trait seams and the error taxonomy shared across the workspace.

use crate::GraphContext;
use async_trait::async_trait;

/// Embedder: text -> vector(s).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text. Default implementation uses embed_batch.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let v = self.embed_batch(&[text.to_string()]).await?;
        v.into_iter().next().ok_or(EmbedError::EmptyResponse)
    }

    /// Embed multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Neighborhood loader injected into the layout engine, decoupling it from
/// the storage adapter.
#[async_trait]
pub trait ContextLoader: Send + Sync {
    async fn load_context(
        &self,
        root_id: &str,
        depth: usize,
    ) -> Result<GraphContext, EngineError>;
}

/// Failure of the underlying store or its transport. Carries provider
/// detail; surfaced to callers unmodified, never retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("store error: {0}")]
    Provider(String),
    #[error("rpc not supported by this store: {0}")]
    RpcUnsupported(String),
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Embedding failure. Soft: callers absorb it and degrade search quality
/// instead of failing the operation.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedding unavailable: {0}")]
    Unavailable(String),
    #[error("empty response from embedding API")]
    EmptyResponse,
}

/// Errors surfaced by the resolver and the semantic index.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("adapter: {0}")]
    Adapter(#[from] AdapterError),
}
