//! HTTP surface: `/status` snapshot, `/healthz` liveness, static assets.

use crate::status::StatusStore;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

pub fn router(status: StatusStore, assets_dir: PathBuf) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/healthz", get(|| async { StatusCode::OK }))
        .fallback_service(ServeDir::new(assets_dir))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; img-src 'self' data:;"),
        ))
        .layer(Extension(status))
}

async fn status_handler(Extension(status): Extension<StatusStore>) -> impl IntoResponse {
    Json(status.snapshot())
}
