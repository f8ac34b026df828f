use axum::http::Method;
use axum::routing::{get, patch, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::core::error::Result;
use crate::engine::engine::Engine;
use crate::http::handlers;

pub fn router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/indexes",
            post(handlers::create_index).get(handlers::list_indexes),
        )
        .route(
            "/indexes/{name}",
            get(handlers::get_index).delete(handlers::delete_index),
        )
        .route("/indexes/{name}/settings", patch(handlers::update_settings))
        .route("/indexes/{name}/rename", post(handlers::rename_index))
        .route("/indexes/{name}/stats", get(handlers::get_stats))
        .route(
            "/indexes/{name}/documents",
            put(handlers::put_documents)
                .get(handlers::list_documents)
                .delete(handlers::delete_all_documents),
        )
        .route(
            "/indexes/{name}/documents/{doc_id}",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route("/indexes/{name}/_search", post(handlers::search))
        .route("/indexes/{name}/_multi_search", post(handlers::multi_search))
        .route("/indexes/{name}/jobs", get(handlers::list_index_jobs))
        .route("/jobs/metrics", get(handlers::job_metrics))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/cancel", post(handlers::cancel_job))
        .layer(cors)
        .with_state(engine)
}

/// Bind and serve until SIGINT/SIGTERM, then drain the job workers.
pub async fn serve(engine: Arc<Engine>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http server listening");

    axum::serve(listener, router(engine.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("http server stopped, draining jobs");
    engine.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
