//! The task service binary.

use portico_server::{Server, ServerConfig};
use portico_tasks::{register_routes, MemoryStore, TaskController, TaskStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), portico_server::ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("PORTICO_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let config = ServerConfig::builder().http_addr(addr).build();

    let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new());
    let controller = Arc::new(TaskController::new(store));

    let mut server = Server::new(config);
    register_routes(&mut server, controller);

    server.run().await
}
