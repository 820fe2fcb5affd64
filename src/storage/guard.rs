use crate::config::NAME_ATTRIBUTE;
use crate::model::{PokemonRecord, RecordId};
use crate::repository::DuplicateKeys;
use crate::storage::condition::{Condition, KeyCondition};
use crate::storage::key::{ItemKey, PARTITION_KEY};
use crate::storage::transact::{DeleteInput, PutInput, TransactInput};
use crate::storage::Item;

use aws_sdk_dynamodb::types;
use serde_dynamo::Result;
use serde_json::Value;

/// Prefix of guard keys, never a valid record id.
const GUARD_PREFIX: &str = "unique";

/// Attribute holding the id of the record that owns a guard.
pub(crate) const OWNER_ATTRIBUTE: &str = "owner";

/// Marker item reserving one value of a unique attribute.
///
/// A guard is written and removed in the same transaction as the record owning
/// it, so a taken value fails the guard's `attribute_not_exists` condition.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UniqueGuard {
    pub(crate) attribute: String,
    pub(crate) value: Value,
}

impl UniqueGuard {
    /// Guards for every configured unique attribute the record carries.
    pub(crate) fn for_record(record: &PokemonRecord, unique_attributes: &[String]) -> Vec<Self> {
        unique_attributes
            .iter()
            .filter_map(|attribute| {
                record
                    .attribute(attribute)
                    .filter(|value| !value.is_null())
                    .map(|value| Self {
                        attribute: attribute.clone(),
                        value,
                    })
            })
            .collect()
    }

    /// Guard on the name attribute, which is always unique.
    pub(crate) fn for_name(name: &str) -> Self {
        Self {
            attribute: NAME_ATTRIBUTE.to_string(),
            value: Value::String(name.to_string()),
        }
    }

    pub(crate) fn key(&self) -> ItemKey {
        let value = match &self.value {
            Value::String(value) => value.clone(),
            other => other.to_string(),
        };
        ItemKey(format!("{GUARD_PREFIX}#{}#{value}", self.attribute))
    }

    /// Stored guard item, owned by `owner`.
    pub(crate) fn item(&self, owner: &RecordId) -> Item {
        let mut item: Item = self.key().into();
        item.insert(
            OWNER_ATTRIBUTE.to_string(),
            types::AttributeValue::S(owner.to_string()),
        );
        item
    }

    /// Put reserving the value, failing when it is already reserved.
    pub(crate) fn put(&self, owner: &RecordId) -> Result<TransactInput> {
        let item = self.item(owner);
        let condition = KeyCondition::<Value>::get_expression_operation(vec![KeyCondition::new(
            PARTITION_KEY,
            Condition::NotExists,
        )])?;
        Ok(TransactInput::Put(PutInput { item, condition }))
    }

    /// Delete releasing the value, only while `owner` holds it or nobody does.
    ///
    /// A missing guard is tolerated so records written before an attribute became
    /// unique can still be renamed and deleted.
    pub(crate) fn delete(&self, owner: &RecordId) -> Result<TransactInput> {
        let condition = KeyCondition::get_any_expression_operation(vec![
            KeyCondition::new(PARTITION_KEY, Condition::NotExists),
            KeyCondition::new(OWNER_ATTRIBUTE, Condition::Equals(owner.to_string())),
        ])?;
        Ok(TransactInput::Delete(DeleteInput {
            key: self.key().into(),
            condition,
        }))
    }
}

/// Owner recorded on a stored guard item.
pub(crate) fn owner_of(item: &Item) -> Option<RecordId> {
    match item.get(OWNER_ATTRIBUTE) {
        Some(types::AttributeValue::S(owner)) => RecordId::parse(owner),
        _ => None,
    }
}

/// Attribute/value pairs of the guards whose writes failed.
pub(crate) fn conflicts<'a>(
    guards: impl IntoIterator<Item = &'a UniqueGuard>,
    failed: impl Fn(usize) -> bool,
) -> DuplicateKeys {
    guards
        .into_iter()
        .enumerate()
        .filter(|(index, _)| failed(*index))
        .map(|(_, guard)| (guard.attribute.clone(), guard.value.clone()))
        .collect()
}
