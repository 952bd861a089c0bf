use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/public/:owner/:meeting_type/slots",
            get(handlers::slots::list_slots),
        )
        .route(
            "/api/public/:owner/:meeting_type/bookings",
            post(handlers::booking::create_booking),
        )
        .route("/api/bookings/:id", get(handlers::booking::get_booking))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
}
