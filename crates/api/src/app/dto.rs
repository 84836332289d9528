use serde::Serialize;

use stockroom_contacts::Contact;
use stockroom_core::Page;
use stockroom_products::Product;

// -------------------------
// Response envelopes
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub result: Vec<Product>,
    pub count: u64,
}

impl From<Page<Product>> for ProductList {
    fn from(page: Page<Product>) -> Self {
        Self {
            result: page.items,
            count: page.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactList {
    pub response: Vec<Contact>,
    pub count: u64,
}

impl From<Page<Contact>> for ContactList {
    fn from(page: Page<Contact>) -> Self {
        Self {
            response: page.items,
            count: page.count,
        }
    }
}

/// Rows soft-deleted by a delete request.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}
