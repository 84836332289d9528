//! Infrastructure layer: storage-backed implementations of the service
//! interfaces and of the validation lookups.

pub mod catalog;

pub use catalog::InMemoryCatalog;
#[cfg(feature = "postgres")]
pub use catalog::PostgresCatalog;
