//! Products and product categories.
//!
//! This crate holds the shapes the products endpoints exchange, the
//! `ProductsService` interface the controller delegates to, and the
//! per-operation validation rules. Storage lives in `stockroom-infra`.

pub mod product;
pub mod rules;
pub mod service;

pub use product::{
    NewProduct, Product, ProductCategory, ProductOrder, ProductQuery, ProductSummary, ProductUpdate,
};
pub use service::ProductsService;
