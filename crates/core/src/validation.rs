//! Field validation toolkit.
//!
//! Each operation declares a [`Validator`]: an ordered list of [`FieldRules`],
//! each an ordered list of [`Rule`]s. Validation runs every rule of every field
//! and collects all violations into [`ValidationErrors`] instead of stopping at
//! the first one.
//!
//! ```ignore
//! let validator = Validator::new()
//!     .field(FieldRules::new("name").required().string().between(4, 30))
//!     .field(FieldRules::new("category_id").required().integer().exists(Relation::ProductCategories));
//! validator.validate(&params, lookup).await?;
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::DomainError;
use crate::lookup::{RecordLookup, Relation, UniqueKey};
use crate::params::{Params, is_blank, value_integer, value_number, value_text};

/// A single constraint on a field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Present and not blank. A blank required field stops further checks.
    Required,
    /// A JSON string (query/form values always are).
    String,
    /// An integer, or a string holding one.
    Integer,
    /// A number, or a string holding one.
    Numeric,
    /// Inclusive size range: character count for text, value for numeric fields.
    Between(u32, u32),
    /// Only ASCII digits, with a digit count in the inclusive range.
    DigitsBetween(u32, u32),
    /// Exact size: character count for text, value for numeric fields.
    Size(u32),
    /// The integer value references an existing row.
    Exists(Relation),
    /// No other row holds this value, ignoring the row whose id is `except`.
    Unique { key: UniqueKey, except: Option<i64> },
}

/// Rules attached to one named field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRules {
    field: &'static str,
    rules: Vec<Rule>,
}

impl FieldRules {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn string(self) -> Self {
        self.rule(Rule::String)
    }

    pub fn integer(self) -> Self {
        self.rule(Rule::Integer)
    }

    pub fn numeric(self) -> Self {
        self.rule(Rule::Numeric)
    }

    pub fn between(self, min: u32, max: u32) -> Self {
        self.rule(Rule::Between(min, max))
    }

    pub fn digits_between(self, min: u32, max: u32) -> Self {
        self.rule(Rule::DigitsBetween(min, max))
    }

    pub fn size(self, size: u32) -> Self {
        self.rule(Rule::Size(size))
    }

    pub fn exists(self, relation: Relation) -> Self {
        self.rule(Rule::Exists(relation))
    }

    pub fn unique(self, key: UniqueKey, except: Option<i64>) -> Self {
        self.rule(Rule::Unique { key, except })
    }

    fn has(&self, wanted: &Rule) -> bool {
        self.rules.iter().any(|r| r == wanted)
    }

    /// Sizes are numeric values when the field is declared numeric.
    fn is_numeric_field(&self) -> bool {
        self.has(&Rule::Numeric) || self.has(&Rule::Integer)
    }
}

/// Field name to messages, keyed in alphabetical field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("the given data was invalid")]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one violation.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Why a validation pass did not succeed.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    /// The input broke one or more rules.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// A storage lookup needed by `Exists`/`Unique` failed.
    #[error("validation lookup failed: {0}")]
    Lookup(#[from] DomainError),
}

/// Ordered set of field rules for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    fields: Vec<FieldRules>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rules: FieldRules) -> Self {
        self.fields.push(rules);
        self
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    /// Check `params` against every rule, collecting all violations.
    pub async fn validate(
        &self,
        params: &Params,
        lookup: &dyn RecordLookup,
    ) -> Result<(), ValidationFailure> {
        let mut errors = ValidationErrors::new();

        for field in &self.fields {
            let name = field.field();
            let attribute = attribute_name(name);
            let value = params.get(name);

            if is_blank(value) {
                if field.has(&Rule::Required) {
                    errors.add(name, format!("The {attribute} field is required."));
                }
                continue;
            }
            let Some(value) = value else { continue };

            for rule in field.rules() {
                if let Some(message) = check(field, rule, value, &attribute, lookup).await? {
                    errors.add(name, message);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(fields = errors.len(), "request failed validation");
            Err(ValidationFailure::Invalid(errors))
        }
    }
}

async fn check(
    field: &FieldRules,
    rule: &Rule,
    value: &Value,
    attribute: &str,
    lookup: &dyn RecordLookup,
) -> Result<Option<String>, DomainError> {
    let message = match rule {
        Rule::Required => None,
        Rule::String => (!value.is_string()).then(|| format!("The {attribute} must be a string.")),
        Rule::Integer => value_integer(value)
            .is_none()
            .then(|| format!("The {attribute} must be an integer.")),
        Rule::Numeric => value_number(value)
            .is_none()
            .then(|| format!("The {attribute} must be a number.")),
        Rule::Between(min, max) => {
            let ok = size_of(field, value)
                .is_some_and(|size| size >= f64::from(*min) && size <= f64::from(*max));
            (!ok).then(|| {
                if field.is_numeric_field() {
                    format!("The {attribute} must be between {min} and {max}.")
                } else {
                    format!("The {attribute} must be between {min} and {max} characters.")
                }
            })
        }
        Rule::Size(size) => {
            let ok = size_of(field, value).is_some_and(|actual| actual == f64::from(*size));
            (!ok).then(|| {
                if field.is_numeric_field() {
                    format!("The {attribute} must be {size}.")
                } else {
                    format!("The {attribute} must be {size} characters.")
                }
            })
        }
        Rule::DigitsBetween(min, max) => {
            let ok = value_text(value).is_some_and(|text| {
                let len = text.len();
                !text.is_empty()
                    && text.bytes().all(|b| b.is_ascii_digit())
                    && len >= *min as usize
                    && len <= *max as usize
            });
            (!ok).then(|| format!("The {attribute} must be between {min} and {max} digits."))
        }
        Rule::Exists(relation) => {
            let found = match value_integer(value) {
                Some(id) => lookup.exists(*relation, id).await?,
                None => false,
            };
            (!found).then(|| format!("The selected {attribute} is invalid."))
        }
        Rule::Unique { key, except } => {
            let free = match value_text(value) {
                Some(text) => lookup.is_unique(*key, &text, *except).await?,
                None => false,
            };
            (!free).then(|| format!("The {attribute} has already been taken."))
        }
    };
    Ok(message)
}

fn size_of(field: &FieldRules, value: &Value) -> Option<f64> {
    if field.is_numeric_field() {
        if let Some(n) = value_number(value) {
            return Some(n);
        }
    }
    value_text(value).map(|text| text.chars().count() as f64)
}

/// `category_id` → `category id`.
fn attribute_name(field: &str) -> String {
    field.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::error::DomainResult;

    /// Lookup over fixed ids and unique values, for rule tests.
    struct FixedLookup {
        ids: Vec<(Relation, i64)>,
        taken: Vec<(UniqueKey, &'static str, i64)>,
    }

    impl FixedLookup {
        fn empty() -> Self {
            Self {
                ids: Vec::new(),
                taken: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl RecordLookup for FixedLookup {
        async fn exists(&self, relation: Relation, id: i64) -> DomainResult<bool> {
            Ok(self.ids.contains(&(relation, id)))
        }

        async fn is_unique(
            &self,
            key: UniqueKey,
            value: &str,
            except: Option<i64>,
        ) -> DomainResult<bool> {
            Ok(!self
                .taken
                .iter()
                .any(|(k, v, owner)| *k == key && *v == value && Some(*owner) != except))
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::from_map(map),
            _ => panic!("expected object"),
        }
    }

    fn name_validator() -> Validator {
        Validator::new().field(FieldRules::new("name").required().string().between(4, 30))
    }

    async fn run(validator: &Validator, p: Value, lookup: &FixedLookup) -> Option<ValidationErrors> {
        match validator.validate(&params(p), lookup).await {
            Ok(()) => None,
            Err(ValidationFailure::Invalid(errors)) => Some(errors),
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_required_field_reports_only_required() {
        let errors = run(&name_validator(), json!({}), &FixedLookup::empty())
            .await
            .unwrap();
        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
    }

    #[tokio::test]
    async fn name_length_boundaries() {
        let lookup = FixedLookup::empty();
        let v = name_validator();

        let errors = run(&v, json!({ "name": "Abc" }), &lookup).await.unwrap();
        assert_eq!(
            errors.get("name").unwrap(),
            ["The name must be between 4 and 30 characters."]
        );
        assert!(run(&v, json!({ "name": "Food" }), &lookup).await.is_none());
        assert!(run(&v, json!({ "name": "a".repeat(30) }), &lookup).await.is_none());
        assert!(run(&v, json!({ "name": "a".repeat(31) }), &lookup).await.is_some());
    }

    #[tokio::test]
    async fn length_counts_characters_not_bytes() {
        let errors = run(&name_validator(), json!({ "name": "Arróz" }), &FixedLookup::empty()).await;
        assert!(errors.is_none());
        let errors = run(&name_validator(), json!({ "name": "ñññ" }), &FixedLookup::empty()).await;
        assert!(errors.is_some());
    }

    #[tokio::test]
    async fn collects_every_violation_across_fields() {
        let v = Validator::new()
            .field(FieldRules::new("name").required().string().between(4, 30))
            .field(FieldRules::new("sell_price").required().numeric())
            .field(FieldRules::new("category_id").required().integer().exists(Relation::ProductCategories));

        let errors = run(
            &v,
            json!({ "name": 12, "sell_price": "cheap", "category_id": "x" }),
            &FixedLookup::empty(),
        )
        .await
        .unwrap();

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.get("name").unwrap(),
            [
                "The name must be a string.",
                "The name must be between 4 and 30 characters."
            ]
        );
        assert_eq!(errors.get("sell_price").unwrap(), ["The sell price must be a number."]);
        assert_eq!(
            errors.get("category_id").unwrap(),
            [
                "The category id must be an integer.",
                "The selected category id is invalid."
            ]
        );
    }

    #[tokio::test]
    async fn optional_absent_field_is_skipped() {
        let v = Validator::new().field(FieldRules::new("stock").numeric());
        assert!(run(&v, json!({}), &FixedLookup::empty()).await.is_none());
        assert!(run(&v, json!({ "stock": "" }), &FixedLookup::empty()).await.is_none());
        assert!(run(&v, json!({ "stock": "many" }), &FixedLookup::empty()).await.is_some());
    }

    #[tokio::test]
    async fn exists_checks_the_lookup() {
        let lookup = FixedLookup {
            ids: vec![(Relation::Products, 5)],
            taken: Vec::new(),
        };
        let v = Validator::new().field(FieldRules::new("product_id").required().exists(Relation::Products));

        assert!(run(&v, json!({ "product_id": 5 }), &lookup).await.is_none());
        assert!(run(&v, json!({ "product_id": "5" }), &lookup).await.is_none());
        let errors = run(&v, json!({ "product_id": 6 }), &lookup).await.unwrap();
        assert_eq!(errors.get("product_id").unwrap(), ["The selected product id is invalid."]);
    }

    #[tokio::test]
    async fn unique_excludes_the_record_being_updated() {
        let lookup = FixedLookup {
            ids: Vec::new(),
            taken: vec![(UniqueKey::ContactPhone, "5551234", 9)],
        };

        let for_create = Validator::new().field(FieldRules::new("phone").unique(UniqueKey::ContactPhone, None));
        let errors = run(&for_create, json!({ "phone": "5551234" }), &lookup).await.unwrap();
        assert_eq!(errors.get("phone").unwrap(), ["The phone has already been taken."]);

        let for_owner = Validator::new().field(FieldRules::new("phone").unique(UniqueKey::ContactPhone, Some(9)));
        assert!(run(&for_owner, json!({ "phone": "5551234" }), &lookup).await.is_none());

        let for_other = Validator::new().field(FieldRules::new("phone").unique(UniqueKey::ContactPhone, Some(3)));
        assert!(run(&for_other, json!({ "phone": "5551234" }), &lookup).await.is_some());
    }

    #[tokio::test]
    async fn digits_between_and_size() {
        let v = Validator::new()
            .field(FieldRules::new("phone").required().digits_between(4, 30).numeric())
            .field(FieldRules::new("role").required().string().size(1));
        let lookup = FixedLookup::empty();

        assert!(run(&v, json!({ "phone": "0123", "role": "c" }), &lookup).await.is_none());
        assert!(run(&v, json!({ "phone": 5551234, "role": "p" }), &lookup).await.is_none());

        let errors = run(&v, json!({ "phone": "12a4", "role": "cp" }), &lookup).await.unwrap();
        assert_eq!(
            errors.get("phone").unwrap(),
            [
                "The phone must be between 4 and 30 digits.",
                "The phone must be a number."
            ]
        );
        assert_eq!(errors.get("role").unwrap(), ["The role must be 1 characters."]);

        let errors = run(&v, json!({ "phone": "123", "role": "x" }), &lookup).await.unwrap();
        assert!(errors.has("phone"));
        assert!(!errors.has("role"));
    }

    #[tokio::test]
    async fn errors_serialize_keyed_by_field() {
        let errors = run(&name_validator(), json!({}), &FixedLookup::empty())
            .await
            .unwrap();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, json!({ "name": ["The name field is required."] }));
    }

    #[test]
    fn fields_iterate_alphabetically() {
        let mut errors = ValidationErrors::new();
        errors.add("stock", "The stock must be an integer.");
        errors.add("name", "The name field is required.");
        errors.add("category_id", "The selected category id is invalid.");

        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, ["category_id", "name", "stock"]);
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    proptest! {
        #[test]
        fn names_within_bounds_pass(name in "[a-zA-Z]{4,30}") {
            let result = block_on(run(&name_validator(), json!({ "name": name }), &FixedLookup::empty()));
            prop_assert!(result.is_none());
        }

        #[test]
        fn names_outside_bounds_fail(name in "[a-zA-Z]{1,3}|[a-zA-Z]{31,60}") {
            let result = block_on(run(&name_validator(), json!({ "name": name }), &FixedLookup::empty()));
            prop_assert!(result.is_some_and(|e| e.has("name")));
        }

        #[test]
        fn any_signed_integer_passes_integer_rule(amount in any::<i64>()) {
            let v = Validator::new().field(FieldRules::new("amount").required().integer());
            let as_number = block_on(run(&v, json!({ "amount": amount }), &FixedLookup::empty()));
            let as_text = block_on(run(&v, json!({ "amount": amount.to_string() }), &FixedLookup::empty()));
            prop_assert!(as_number.is_none());
            prop_assert!(as_text.is_none());
        }
    }
}
