use crate::model::PokemonRecord;
use crate::storage::condition::{Condition, KeyCondition};
use crate::storage::guard::UniqueGuard;
use crate::storage::key::{ItemKey, PARTITION_KEY};
use crate::storage::transact::{DeleteInput, TransactInput, Transaction};

use aws_sdk_dynamodb::{Client, error, operation};
use serde_dynamo::Result;

/// delete record operation
#[derive(Clone, Debug, PartialEq)]
struct DeleteRecordInput {
    transaction: Transaction,
}

/// Delete a record and release its uniqueness guards.
///
/// The record delete comes first in the transaction and only succeeds while the
/// record exists with the unique values it was read with.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DeleteRecord<'a> {
    pub(crate) current: &'a PokemonRecord,
    pub(crate) unique_attributes: &'a [String],
    pub(crate) table_name: &'a str,
}

impl TryFrom<DeleteRecord<'_>> for DeleteRecordInput {
    type Error = serde_dynamo::Error;

    fn try_from(delete_record: DeleteRecord<'_>) -> Result<Self> {
        let guards = UniqueGuard::for_record(delete_record.current, delete_record.unique_attributes);
        let mut conditions = vec![KeyCondition::new(PARTITION_KEY, Condition::Exists)];
        for guard in &guards {
            conditions.push(KeyCondition::new(
                guard.attribute.clone(),
                Condition::Equals(guard.value.clone()),
            ));
        }
        let condition = KeyCondition::get_expression_operation(conditions)?;
        let key = ItemKey::from(&delete_record.current.id).into();
        let mut items = vec![TransactInput::Delete(DeleteInput { key, condition })];
        for guard in &guards {
            items.push(guard.delete(&delete_record.current.id)?);
        }
        let transaction = Transaction {
            items,
            table_name: delete_record.table_name.to_string(),
        };
        Ok(Self { transaction })
    }
}

impl DeleteRecord<'_> {
    /// Execute the delete operation.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<
        operation::transact_write_items::TransactWriteItemsOutput,
        error::SdkError<operation::transact_write_items::TransactWriteItemsError>,
    > {
        let delete_record: DeleteRecordInput = self.try_into().map_err(error::BuildError::other)?;
        delete_record.transaction.send(client).await
    }
}
