use crate::storage::{ExpressionInput, Item};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// Code DynamoDB reports for an item whose condition expression failed.
pub(crate) const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

/// Conditional put of a whole item.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PutInput {
    pub(crate) item: Item,
    pub(crate) condition: ExpressionInput,
}

/// Conditional delete by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DeleteInput {
    pub(crate) key: Item,
    pub(crate) condition: ExpressionInput,
}

/// Conditional update by key.
///
/// Placeholder maps are shared between the update and the condition expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct UpdateInput {
    pub(crate) key: Item,
    pub(crate) update_expression: String,
    pub(crate) condition_expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl UpdateInput {
    pub(crate) fn new(key: Item, update: ExpressionInput, condition: ExpressionInput) -> Self {
        let mut expression_attribute_names = update.expression_attribute_names;
        expression_attribute_names.extend(condition.expression_attribute_names);
        let mut expression_attribute_values = update.expression_attribute_values;
        expression_attribute_values.extend(condition.expression_attribute_values);
        Self {
            key,
            update_expression: update.expression,
            condition_expression: condition.expression,
            expression_attribute_names,
            expression_attribute_values,
        }
    }
}

/// One write inside a transaction.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TransactInput {
    Put(PutInput),
    Delete(DeleteInput),
    Update(UpdateInput),
}

impl TransactInput {
    fn into_transact_write_item(
        self,
        table_name: &str,
    ) -> Result<types::TransactWriteItem, error::BuildError> {
        let builder = types::TransactWriteItem::builder();
        let builder = match self {
            Self::Put(put) => {
                let (condition, names, values) = put.condition.into_parts();
                let put = types::Put::builder()
                    .set_item(Some(put.item))
                    .condition_expression(condition)
                    .set_expression_attribute_names(names)
                    .set_expression_attribute_values(values)
                    .table_name(table_name)
                    .build()?;
                builder.put(put)
            }
            Self::Delete(delete) => {
                let (condition, names, values) = delete.condition.into_parts();
                let delete = types::Delete::builder()
                    .set_key(Some(delete.key))
                    .condition_expression(condition)
                    .set_expression_attribute_names(names)
                    .set_expression_attribute_values(values)
                    .table_name(table_name)
                    .build()?;
                builder.delete(delete)
            }
            Self::Update(update) => {
                let names = (!update.expression_attribute_names.is_empty())
                    .then_some(update.expression_attribute_names);
                let values = (!update.expression_attribute_values.is_empty())
                    .then_some(update.expression_attribute_values);
                let update = types::Update::builder()
                    .set_key(Some(update.key))
                    .update_expression(update.update_expression)
                    .condition_expression(update.condition_expression)
                    .set_expression_attribute_names(names)
                    .set_expression_attribute_values(values)
                    .table_name(table_name)
                    .build()?;
                builder.update(update)
            }
        };
        Ok(builder.build())
    }
}

/// Atomic group of conditional writes against one table.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Transaction {
    pub(crate) items: Vec<TransactInput>,
    pub(crate) table_name: String,
}

impl Transaction {
    /// Execute the transaction.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::transact_write_items::TransactWriteItemsOutput,
        error::SdkError<operation::transact_write_items::TransactWriteItemsError>,
    > {
        if self.items.is_empty() {
            return Err(error::BuildError::other("transaction without items").into());
        }
        let mut transact_items = Vec::with_capacity(self.items.len());
        for item in self.items {
            transact_items.push(item.into_transact_write_item(&self.table_name)?);
        }
        client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
    }
}

/// Per-item cancellation codes when a transaction was cancelled, in request order.
pub(crate) fn cancellation_codes(
    error: &error::SdkError<operation::transact_write_items::TransactWriteItemsError>,
) -> Option<Vec<String>> {
    match error.as_service_error() {
        Some(
            operation::transact_write_items::TransactWriteItemsError::TransactionCanceledException(
                cancelled,
            ),
        ) => Some(
            cancelled
                .cancellation_reasons()
                .iter()
                .map(|reason| reason.code().unwrap_or("None").to_string())
                .collect(),
        ),
        _ => None,
    }
}
