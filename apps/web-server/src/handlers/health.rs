//! Health check endpoint.

use actix_web::{HttpResponse, web};

use feedline_shared::dto::HealthResponse;

use crate::state::AppState;

/// GET /health/
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store_backend.to_string(),
        cache: state.cache_backend.to_string(),
    })
}
