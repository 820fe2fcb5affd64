use crate::storage::Item;
use crate::storage::key::ItemKey;

use aws_sdk_dynamodb::{Client, error, operation};

/// get record operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetRecordInput {
    consistent_read: bool,
    key: Item,
    table_name: String,
}

/// Read one item by key: a record or a uniqueness guard.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GetRecord<'a> {
    /// Strongly consistent read, used before transactional writes and on guards.
    pub(crate) consistent_read: bool,
    pub(crate) key: ItemKey,
    pub(crate) table_name: &'a str,
}

impl From<GetRecord<'_>> for GetRecordInput {
    fn from(get_record: GetRecord<'_>) -> Self {
        Self {
            consistent_read: get_record.consistent_read,
            key: get_record.key.into(),
            table_name: get_record.table_name.to_string(),
        }
    }
}

impl GetRecord<'_> {
    /// Execute the get operation.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_record: GetRecordInput = self.into();
        client
            .get_item()
            .set_key(Some(get_record.key))
            .consistent_read(get_record.consistent_read)
            .table_name(get_record.table_name)
            .send()
            .await
    }
}
