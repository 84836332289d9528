//! Catalog storage: products, product categories and contacts.
//!
//! A catalog implements `ProductsService`, `ContactsService` and
//! `RecordLookup` over one backing store, so validation lookups and the
//! writes they guard always see the same data.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryCatalog;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalog;

/// Case-insensitive substring match used by the listing filters.
pub(crate) fn matches_search(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
