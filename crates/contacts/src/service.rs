use async_trait::async_trait;

use stockroom_core::{ContactId, DomainResult, Page};

use crate::contact::{Contact, ContactQuery, ContactSummary, ContactUpdate, NewContact};

/// Persistence and business logic behind the contacts endpoints.
#[async_trait]
pub trait ContactsService: Send + Sync {
    /// One page of live contacts with the requested role, plus the total match count.
    async fn get_contacts(&self, query: ContactQuery) -> DomainResult<Page<Contact>>;

    async fn get_contacts_minified(&self) -> DomainResult<Vec<ContactSummary>>;

    async fn get_contact_by_id(&self, id: ContactId) -> DomainResult<Option<Contact>>;

    /// Soft-delete; returns the number of rows affected.
    async fn delete_contact_by_id(&self, id: ContactId) -> DomainResult<u64>;

    async fn post_contact(&self, contact: NewContact) -> DomainResult<Contact>;

    async fn update_contact(&self, update: ContactUpdate) -> DomainResult<Contact>;
}
