//! recall REST API server.

use recall_api::server::{self, AppState};
use recall_embed::OpenAiEmbedder;
use recall_engine::{ContextResolver, SemanticIndex};
use recall_store::{InMemoryStoreClient, MemoryStore, StoreClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client: Arc<dyn StoreClient> = Arc::new(InMemoryStoreClient::new());
    let store = Arc::new(MemoryStore::new(client));
    let embedder = Arc::new(OpenAiEmbedder::from_env());
    let state = Arc::new(AppState {
        index: Arc::new(SemanticIndex::new(Arc::clone(&store), embedder)),
        resolver: Arc::new(ContextResolver::new(store)),
    });

    let app = server::router(state);
    let addr: SocketAddr = std::env::var("RECALL_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:8010".to_string())
        .parse()?;
    tracing::info!("recall API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
