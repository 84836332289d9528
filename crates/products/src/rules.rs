//! Validation rules for each products operation.

use stockroom_core::{FieldRules, Relation, UniqueKey, Validator};

fn name() -> FieldRules {
    FieldRules::new("name").required().string().between(4, 30)
}

fn product_fields() -> Validator {
    Validator::new()
        .field(name())
        .field(
            FieldRules::new("category_id")
                .required()
                .integer()
                .exists(Relation::ProductCategories),
        )
        .field(FieldRules::new("sell_price").required().numeric())
        .field(FieldRules::new("buy_price").required().numeric())
        .field(FieldRules::new("stock").numeric())
}

pub fn delete_product() -> Validator {
    Validator::new().field(
        FieldRules::new("product_id")
            .required()
            .numeric()
            .exists(Relation::Products),
    )
}

pub fn create_product() -> Validator {
    product_fields()
}

pub fn update_product() -> Validator {
    product_fields().field(
        FieldRules::new("product_id")
            .required()
            .integer()
            .exists(Relation::Products),
    )
}

pub fn adjust_stock() -> Validator {
    Validator::new()
        .field(FieldRules::new("product_id").required().exists(Relation::Products))
        .field(FieldRules::new("amount").required().integer())
}

pub fn create_category() -> Validator {
    Validator::new().field(name().unique(UniqueKey::CategoryName, None))
}

/// `category_id` is the record being renamed; its own name does not count as taken.
pub fn update_category(category_id: Option<i64>) -> Validator {
    Validator::new()
        .field(name().unique(UniqueKey::CategoryName, category_id))
        .field(
            FieldRules::new("category_id")
                .required()
                .numeric()
                .exists(Relation::ProductCategories),
        )
}

pub fn delete_category() -> Validator {
    Validator::new().field(
        FieldRules::new("category_id")
            .required()
            .numeric()
            .exists(Relation::ProductCategories),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use stockroom_core::validation::ValidationFailure;
    use stockroom_core::{DomainResult, Params, RecordLookup, ValidationErrors};

    /// Categories 1 ("Food") and 2 ("Tools"), product 10.
    struct Shelf;

    #[async_trait]
    impl RecordLookup for Shelf {
        async fn exists(&self, relation: Relation, id: i64) -> DomainResult<bool> {
            Ok(match relation {
                Relation::ProductCategories => id == 1 || id == 2,
                Relation::Products => id == 10,
                Relation::Contacts => false,
            })
        }

        async fn is_unique(
            &self,
            key: UniqueKey,
            value: &str,
            except: Option<i64>,
        ) -> DomainResult<bool> {
            let owner = match (key, value) {
                (UniqueKey::CategoryName, "Food") => Some(1),
                (UniqueKey::CategoryName, "Tools") => Some(2),
                _ => None,
            };
            Ok(owner.is_none() || owner == except)
        }
    }

    async fn errors(validator: Validator, body: Value) -> Option<ValidationErrors> {
        let Value::Object(map) = body else {
            panic!("expected object")
        };
        match validator.validate(&Params::from_map(map), &Shelf).await {
            Ok(()) => None,
            Err(ValidationFailure::Invalid(e)) => Some(e),
            Err(e) => panic!("lookup failed: {e}"),
        }
    }

    #[tokio::test]
    async fn create_product_requires_every_mandatory_field() {
        let e = errors(create_product(), json!({})).await.unwrap();
        let fields: Vec<_> = e.fields().collect();
        assert_eq!(fields, ["buy_price", "category_id", "name", "sell_price"]);
    }

    #[tokio::test]
    async fn create_product_accepts_optional_stock() {
        let body = json!({ "name": "Rice", "category_id": 1, "sell_price": "2.5", "buy_price": 1 });
        assert!(errors(create_product(), body).await.is_none());

        let body = json!({ "name": "Rice", "category_id": 1, "sell_price": 2, "buy_price": 1, "stock": "lots" });
        assert!(errors(create_product(), body).await.unwrap().has("stock"));
    }

    #[tokio::test]
    async fn create_product_rejects_unknown_category() {
        let body = json!({ "name": "Rice", "category_id": 9, "sell_price": 2, "buy_price": 1 });
        let e = errors(create_product(), body).await.unwrap();
        assert_eq!(e.get("category_id").unwrap(), ["The selected category id is invalid."]);
    }

    #[tokio::test]
    async fn update_product_needs_an_existing_product() {
        let body = json!({ "name": "Rice", "category_id": 1, "sell_price": 2, "buy_price": 1 });
        let e = errors(update_product(), body.clone()).await.unwrap();
        assert_eq!(e.get("product_id").unwrap(), ["The product id field is required."]);

        let mut with_id = body;
        with_id["product_id"] = json!(10);
        assert!(errors(update_product(), with_id).await.is_none());
    }

    #[tokio::test]
    async fn adjust_stock_accepts_negative_amounts() {
        let ok = json!({ "product_id": 10, "amount": -7 });
        assert!(errors(adjust_stock(), ok).await.is_none());

        let e = errors(adjust_stock(), json!({ "product_id": 11, "amount": 1.5 })).await.unwrap();
        assert!(e.has("product_id"));
        assert!(e.has("amount"));
    }

    #[tokio::test]
    async fn category_name_boundaries_and_uniqueness() {
        assert!(errors(create_category(), json!({ "name": "Abc" })).await.is_some());
        assert!(errors(create_category(), json!({ "name": "Drinks" })).await.is_none());

        let e = errors(create_category(), json!({ "name": "Food" })).await.unwrap();
        assert_eq!(e.get("name").unwrap(), ["The name has already been taken."]);
    }

    #[tokio::test]
    async fn update_category_excludes_its_own_name() {
        let own = json!({ "name": "Food", "category_id": 1 });
        assert!(errors(update_category(Some(1)), own).await.is_none());

        let other = json!({ "name": "Tools", "category_id": 1 });
        let e = errors(update_category(Some(1)), other).await.unwrap();
        assert!(e.has("name"));
    }

    #[tokio::test]
    async fn delete_rules_require_existing_ids() {
        assert!(errors(delete_product(), json!({ "product_id": "10" })).await.is_none());
        assert!(errors(delete_product(), json!({ "product_id": "ten" })).await.is_some());
        assert!(errors(delete_category(), json!({ "category_id": 2 })).await.is_none());
        assert!(errors(delete_category(), json!({})).await.is_some());
    }
}
