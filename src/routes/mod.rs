use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{response::ErrorBody, state::AppState};

pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;

/// Build the `/api` router. Guards need the state up front, the router itself
/// receives it at the top level.
pub fn create_api_router(state: &AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(auth::router())
        .merge(products::router(state))
        .merge(orders::router(state))
        .layer(cors)
}

/// Every route of the service, state applied. Transport layers are added by the binary.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(&state))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    tracing::debug!(path = %uri.path(), "no route");
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not Found")))
}
