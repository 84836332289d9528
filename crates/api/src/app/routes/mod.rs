use axum::Router;

pub mod common;
pub mod contacts;
pub mod products;
pub mod system;

/// Router for every endpoint behind authentication.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/contacts", contacts::router())
}
