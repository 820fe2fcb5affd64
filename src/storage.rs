//! DynamoDB persistence for Pokemon records.
//!
//! Every request follows the same shape: a request struct describing the operation
//! in domain terms, a resolved `…Input` struct holding expression strings and
//! attribute maps, and an async `send` applying it to the SDK fluent builder.

/// Bulk put and delete requests used for seeding.
pub(crate) mod batch_write;

/// Condition expressions guarding writes.
pub(crate) mod condition;

/// Transactional record creation.
pub(crate) mod create_record;

/// Transactional record deletion.
pub(crate) mod delete_record;

/// Single record reads by id.
pub(crate) mod get_record;

/// Uniqueness guard items.
pub(crate) mod guard;

/// Item keys.
pub(crate) mod key;

/// Secondary index queries for lookups and ordered listing.
pub(crate) mod query_index;

/// Repository implementation over the request types.
mod repository;

/// Full table scans of item keys.
pub(crate) mod scan_keys;

/// Atomic multi-item writes.
pub(crate) mod transact;

/// Transactional record updates.
pub(crate) mod update_record;

pub use repository::DynamoRepository;

use crate::model::PokemonRecord;
use crate::repository::RepositoryError;

use aws_sdk_dynamodb::types;
use serde_dynamo::{Result, from_item, to_item};
use std::collections;

/// DynamoDB item.
pub(crate) type Item = collections::HashMap<String, types::AttributeValue>;

/// Attribute marking record items, partition key of the listing index.
pub(crate) const ENTITY_ATTRIBUTE: &str = "entity";

/// Value of [`ENTITY_ATTRIBUTE`] on every record item.
pub(crate) const ENTITY_VALUE: &str = "pokemon";

/// Internal revision counter, bumped by every update.
pub(crate) const VERSION_ATTRIBUTE: &str = "version";

/// Convert a record into the item stored for it.
pub(crate) fn record_to_item(record: &PokemonRecord) -> Result<Item> {
    let mut item: Item = to_item(record)?;
    item.insert(
        ENTITY_ATTRIBUTE.to_string(),
        types::AttributeValue::S(ENTITY_VALUE.to_string()),
    );
    item.insert(
        VERSION_ATTRIBUTE.to_string(),
        types::AttributeValue::N("0".to_string()),
    );
    Ok(item)
}

/// Convert a stored item back into a record, dropping internal attributes.
pub(crate) fn item_to_record(mut item: Item) -> Result<PokemonRecord> {
    item.remove(ENTITY_ATTRIBUTE);
    item.remove(VERSION_ATTRIBUTE);
    from_item(item)
}

/// Collapse an SDK or serialization failure into a backend error with full detail.
pub(crate) fn backend_error<E>(operation: &str, error: E) -> RepositoryError
where
    E: std::error::Error,
{
    RepositoryError::Backend(format!("{operation}: {}", error_chain(&error)))
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Resolved expression with its placeholder maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    /// Placeholder maps as the SDK builders expect them, `None` when empty.
    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        Option<collections::HashMap<String, String>>,
        Option<collections::HashMap<String, types::AttributeValue>>,
    ) {
        let names = (!self.expression_attribute_names.is_empty())
            .then_some(self.expression_attribute_names);
        let values = (!self.expression_attribute_values.is_empty())
            .then_some(self.expression_attribute_values);
        (self.expression, names, values)
    }
}
