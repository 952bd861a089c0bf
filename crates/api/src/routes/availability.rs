use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/owners/:owner_id/availability/weekly",
            get(handlers::availability::get_weekly),
        )
        .route(
            "/api/owners/:owner_id/availability/weekly",
            put(handlers::availability::replace_weekly),
        )
}
