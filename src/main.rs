mod config;
mod render;
mod routes;
mod state;
mod storage;
mod templates;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certificado=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    let state = Arc::new(state::AppState {
        config: config.clone(),
        http: reqwest::Client::new(),
        batches: storage::BatchStore::new(config.max_batches),
    });

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/generate", post(routes::generate_handler))
        .route("/results/:batch_id", get(routes::view_results))
        .route("/api/status/:batch_id", get(routes::batch_status))
        .route("/download/:batch_id/:filename", get(routes::download_certificate))
        .route("/download_all/:batch_id", get(routes::download_all))
        .nest_service("/static", tower_http::services::ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Certificado listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
