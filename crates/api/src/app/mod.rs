//! HTTP application wiring (Axum router + service injection).
//!
//! - `services.rs`: the service handles controllers delegate to
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `params.rs`: the uniform request-parameter extractor
//! - `dto.rs`: response envelopes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockroom_auth::{Hs256JwtValidator, JwtValidator};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod params;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from the configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;

    let jwt: Option<Arc<dyn JwtValidator>> = match &config.jwt_secret {
        Some(secret) => Some(Arc::new(Hs256JwtValidator::new(secret.as_bytes()))),
        None => {
            tracing::warn!("JWT_SECRET not set; serving every route without authentication");
            None
        }
    };

    Ok(build_router(services, jwt))
}

/// Router over the given services; `jwt: None` disables authentication.
pub fn build_router(services: AppServices, jwt: Option<Arc<dyn JwtValidator>>) -> Router {
    let mut protected = routes::router().layer(Extension(Arc::new(services)));
    if let Some(jwt) = jwt {
        protected = protected.layer(axum::middleware::from_fn_with_state(
            middleware::AuthState { jwt },
            middleware::auth_middleware,
        ));
    }

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_span)))
}
