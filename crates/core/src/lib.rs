//! `stockroom-core`: shared building blocks for the inventory/contacts backend.
//!
//! This crate holds identifiers, the service-layer error model, the uniform
//! request parameter bag and the field validation toolkit. It has no HTTP or
//! storage dependencies.

pub mod error;
pub mod id;
pub mod lookup;
pub mod page;
pub mod params;
pub mod validation;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ContactId, ProductHistoryId, ProductId};
pub use lookup::{RecordLookup, Relation, UniqueKey};
pub use page::{PAGE_SIZE, Page};
pub use params::Params;
pub use validation::{FieldRules, Rule, ValidationErrors, ValidationFailure, Validator};
