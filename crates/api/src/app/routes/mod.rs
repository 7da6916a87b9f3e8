use axum::{routing::get, Router};

pub mod bookings;
pub mod common;
pub mod conferences;
pub mod system;

/// Router for every endpoint that sees a [`crate::context::CallerContext`].
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/conferences", conferences::router())
}
