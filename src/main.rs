use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

use findex::engine::engine::Engine;
use findex::http::server;

/// Embeddable typo-tolerant full-text search engine over HTTP.
#[derive(Parser, Debug)]
#[command(name = "findex", version, about)]
struct Args {
    /// Port the HTTP server listens on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Directory holding index snapshots.
    #[arg(long, default_value = "./search_data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let engine = match Engine::new(args.data_dir) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "failed to open data directory");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(engine, args.port).await {
        error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
