//! Validation rules for each contacts operation.

use stockroom_core::{FieldRules, Relation, UniqueKey, Validator};

fn text(field: &'static str) -> FieldRules {
    FieldRules::new(field).required().string().between(4, 30)
}

fn money() -> FieldRules {
    FieldRules::new("money").required().numeric()
}

pub fn delete_contact() -> Validator {
    Validator::new().field(FieldRules::new("contact_id").required().exists(Relation::Contacts))
}

pub fn create_contact() -> Validator {
    Validator::new()
        .field(text("name"))
        .field(
            FieldRules::new("phone")
                .required()
                .digits_between(4, 30)
                .numeric()
                .unique(UniqueKey::ContactPhone, None),
        )
        .field(text("address"))
        .field(FieldRules::new("role").required().string().size(1))
        .field(money())
}

/// `contact_id` is the record being updated; its own phone does not count as taken.
pub fn update_contact(contact_id: Option<i64>) -> Validator {
    Validator::new()
        .field(text("name"))
        .field(text("address"))
        .field(
            FieldRules::new("contact_id")
                .required()
                .integer()
                .exists(Relation::Contacts),
        )
        .field(money())
        .field(
            FieldRules::new("phone")
                .required()
                .numeric()
                .unique(UniqueKey::ContactPhone, contact_id),
        )
}
