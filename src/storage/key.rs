use crate::model::RecordId;
use crate::storage::Item;

use aws_sdk_dynamodb::types;

/// Partition key attribute of the table.
pub(crate) const PARTITION_KEY: &str = "id";

/// Primary key of an item: a record id or a guard key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ItemKey(pub(crate) String);

impl From<&RecordId> for ItemKey {
    fn from(id: &RecordId) -> Self {
        Self(id.to_string())
    }
}

impl From<ItemKey> for Item {
    fn from(key: ItemKey) -> Self {
        Self::from([(PARTITION_KEY.to_string(), types::AttributeValue::S(key.0))])
    }
}

impl ItemKey {
    /// Read the key back from a stored item.
    pub(crate) fn from_item(item: &Item) -> Option<Self> {
        match item.get(PARTITION_KEY) {
            Some(types::AttributeValue::S(value)) => Some(Self(value.clone())),
            _ => None,
        }
    }
}
