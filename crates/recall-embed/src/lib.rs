//! OpenAI-compatible embedding client.

#[cfg(feature = "test-util")]
pub mod mock;
mod openai;

pub use openai::OpenAiEmbedder;
pub use recall_types::{EmbedError, Embedder};

#[cfg(feature = "test-util")]
pub use mock::{MockEmbedder, UnavailableEmbedder};
