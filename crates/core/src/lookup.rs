//! Existence and uniqueness checks against storage.
//!
//! The validation toolkit asks these questions; the storage layer answers
//! them. Keeping the interface here lets validation stay storage-agnostic.

use async_trait::async_trait;

use crate::error::DomainResult;

/// A table whose rows can be referenced by id from request parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    Products,
    ProductCategories,
    Contacts,
}

impl Relation {
    pub fn table(self) -> &'static str {
        match self {
            Relation::Products => "products",
            Relation::ProductCategories => "product_categories",
            Relation::Contacts => "contacts",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            Relation::Products => "product_id",
            Relation::ProductCategories => "category_id",
            Relation::Contacts => "contact_id",
        }
    }
}

/// A column that must hold distinct values across its table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    CategoryName,
    ContactPhone,
}

impl UniqueKey {
    pub fn relation(self) -> Relation {
        match self {
            UniqueKey::CategoryName => Relation::ProductCategories,
            UniqueKey::ContactPhone => Relation::Contacts,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            UniqueKey::CategoryName => "name",
            UniqueKey::ContactPhone => "phone",
        }
    }
}

/// Storage-backed lookups used by `Rule::Exists` and `Rule::Unique`.
///
/// Soft-deleted rows still count: a deleted record keeps its id and its
/// unique values reserved.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Whether a row with this id exists in `relation`.
    async fn exists(&self, relation: Relation, id: i64) -> DomainResult<bool>;

    /// Whether `value` is free in the `key` column, ignoring the row whose id
    /// equals `except` (self-exclusion on update).
    async fn is_unique(&self, key: UniqueKey, value: &str, except: Option<i64>)
    -> DomainResult<bool>;
}
