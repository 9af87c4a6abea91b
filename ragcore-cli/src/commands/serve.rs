//! ABOUTME: `ragcore serve`: wires every adapter and launches the HTTP+SSE API

use super::wiring;
use ragcore_api::AppState;
use ragcore_config::RagConfig;

pub async fn run(config: RagConfig, addr: String) -> anyhow::Result<()> {
    let adapters = wiring::build(&config)?;
    let state = AppState::new(
        adapters.embedding,
        adapters.vector_store,
        adapters.reranker,
        adapters.graph_store,
        adapters.relational_store,
        adapters.cache,
        adapters.llm,
        config,
    );

    let addr: std::net::SocketAddr = addr.parse().map_err(|e| anyhow::anyhow!("invalid --addr {addr:?}: {e}"))?;
    ragcore_api::serve(state, addr).await
}
