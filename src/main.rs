//! dailies server entry point.

use std::sync::Arc;

use dailies::directory::InMemoryDirectory;
use dailies::web::WebServer;
use dailies::{logging, Config};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dailies.toml".to_string());

    let config = match Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    // The tracker application normally provides the directory; a standalone
    // run starts with an empty in-memory one.
    let directory = Arc::new(InMemoryDirectory::new());

    let server = match WebServer::new(&config, directory) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
