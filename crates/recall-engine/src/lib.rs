//! Memory graph engine: bounded-depth context resolution and semantic
//! search with a deterministic lexical fallback.

mod context;
mod index;

pub use context::ContextResolver;
pub use index::SemanticIndex;
pub use recall_types::{EngineError, GraphContext, SearchOutcome, SearchTier};
