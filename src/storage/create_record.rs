use crate::model::PokemonRecord;
use crate::storage::condition::{Condition, KeyCondition};
use crate::storage::guard::UniqueGuard;
use crate::storage::key::PARTITION_KEY;
use crate::storage::transact::{PutInput, TransactInput, Transaction};
use crate::storage::record_to_item;

use aws_sdk_dynamodb::{Client, error, operation};
use serde_json::Value;

/// create record operation
#[derive(Clone, Debug, PartialEq)]
struct CreateRecordInput {
    transaction: Transaction,
}

/// Put a new record together with its uniqueness guards.
///
/// The record put comes first in the transaction, followed by one put per guard
/// in the order of [`CreateRecord::guards`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CreateRecord<'a> {
    pub(crate) record: &'a PokemonRecord,
    pub(crate) unique_attributes: &'a [String],
    pub(crate) table_name: &'a str,
}

impl CreateRecord<'_> {
    pub(crate) fn guards(&self) -> Vec<UniqueGuard> {
        UniqueGuard::for_record(self.record, self.unique_attributes)
    }

    /// Position of each guard's put within the transaction, after the record put.
    pub(crate) fn guard_positions(&self) -> Vec<usize> {
        (1..=self.guards().len()).collect()
    }
}

impl TryFrom<CreateRecord<'_>> for CreateRecordInput {
    type Error = serde_dynamo::Error;

    fn try_from(create_record: CreateRecord<'_>) -> serde_dynamo::Result<Self> {
        let item = record_to_item(create_record.record)?;
        let condition = KeyCondition::<Value>::get_expression_operation(vec![KeyCondition::new(
            PARTITION_KEY,
            Condition::NotExists,
        )])?;
        let mut items = vec![TransactInput::Put(PutInput { item, condition })];
        for guard in create_record.guards() {
            items.push(guard.put(&create_record.record.id)?);
        }
        let transaction = Transaction {
            items,
            table_name: create_record.table_name.to_string(),
        };
        Ok(Self { transaction })
    }
}

impl CreateRecord<'_> {
    /// Execute the create operation.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::transact_write_items::TransactWriteItemsOutput,
        error::SdkError<operation::transact_write_items::TransactWriteItemsError>,
    > {
        let create_record: CreateRecordInput = self.try_into().map_err(error::BuildError::other)?;
        create_record.transaction.send(client).await
    }
}
