//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, dispatcher and service wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use boxoffice_infra::{AppConfig, StoreError, store};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router over already-wired services.
pub fn build_app(jwt_secret: &str, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(boxoffice_auth::Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt };

    // Every routed request carries a CallerContext; handlers decide what it needs.
    let routed = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routed)
        .layer(ServiceBuilder::new())
}

/// Open the configured store and build the router on top of it.
pub async fn build_app_from_config(config: &AppConfig) -> Result<Router, StoreError> {
    let store = store::connect(&config.store).await?;
    let services = Arc::new(AppServices::new(store, config.dispatch));
    Ok(build_app(&config.jwt_secret, services))
}
