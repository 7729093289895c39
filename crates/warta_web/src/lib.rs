use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use warta_core::Result;

pub mod error;
pub mod handlers;
pub mod state;
pub mod v1;

pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/articles", get(v1::list_articles).post(v1::create_article))
        .route("/articles/bulk", post(v1::create_bulk))
        .route("/articles/:id", get(v1::get_article).delete(v1::delete_article))
        .route("/latest", get(v1::latest))
        .route("/export", get(v1::export));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/scrape", post(handlers::scrape))
        .route(
            "/api/articles",
            get(handlers::list_articles).delete(handlers::delete_articles),
        )
        .route("/api/stats", get(handlers::stats))
        .route("/api/provinces", get(handlers::provinces))
        .nest("/api/v1", v1)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(Arc::new(state))
}

/// Serves the API on `addr` until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌍 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use warta_core::{Article, Error, Result};
}
