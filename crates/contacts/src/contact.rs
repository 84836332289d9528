use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ContactId, DomainError};

/// Role of a customer contact.
pub const ROLE_CUSTOMER: &str = "c";

/// Role of a provider contact.
pub const ROLE_PROVIDER: &str = "p";

/// A customer or provider.
///
/// `money` is the running balance with the contact; negative means we owe them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: ContactId,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub role: String,
    pub money: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn is_customer(&self) -> bool {
        self.role == ROLE_CUSTOMER
    }

    pub fn is_provider(&self) -> bool {
        self.role == ROLE_PROVIDER
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn summary(&self) -> ContactSummary {
        ContactSummary {
            contact_id: self.contact_id,
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

/// Minified contact projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub contact_id: ContactId,
    pub name: String,
    pub role: String,
}

/// Column a contact listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactOrder {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
    Money,
}

impl ContactOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactOrder::Name => "name",
            ContactOrder::CreatedAt => "created_at",
            ContactOrder::UpdatedAt => "updated_at",
            ContactOrder::Money => "money",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for ContactOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(ContactOrder::Name),
            "created_at" => Ok(ContactOrder::CreatedAt),
            "updated_at" => Ok(ContactOrder::UpdatedAt),
            "money" => Ok(ContactOrder::Money),
            other => Err(DomainError::validation(format!("unknown contact order: {other}"))),
        }
    }
}

/// Filters for a contact listing, as received from the client.
///
/// `role` is not checked against the known roles; a role no contact has
/// simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub offset: i64,
    pub search: String,
    pub role: String,
    pub order: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub role: String,
    pub money: f64,
    pub address: String,
}

/// Replacement fields for an existing contact. The role is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUpdate {
    pub contact_id: ContactId,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub money: f64,
}
