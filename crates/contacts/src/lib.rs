//! Contacts: customers and providers.
//!
//! Shapes exchanged by the contacts endpoints, the `ContactsService`
//! interface, and the per-operation validation rules.

pub mod contact;
pub mod rules;
pub mod service;

pub use contact::{
    Contact, ContactOrder, ContactQuery, ContactSummary, ContactUpdate, NewContact, ROLE_CUSTOMER,
    ROLE_PROVIDER,
};
pub use service::ContactsService;
