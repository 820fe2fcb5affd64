use crate::model::{PokemonPatch, PokemonRecord};
use crate::storage::condition::{Condition, KeyCondition};
use crate::storage::guard::UniqueGuard;
use crate::storage::key::{ItemKey, PARTITION_KEY};
use crate::storage::transact::{TransactInput, Transaction, UpdateInput};
use crate::storage::{ExpressionInput, VERSION_ATTRIBUTE};

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde_dynamo::{Result, to_attribute_value};
use serde_json::Value;
use std::collections;

/// Build the SET expression assigning every patched attribute and bumping the version.
///
/// Payload attribute names are arbitrary, so they are referenced through indexed
/// placeholders rather than their own names.
fn get_set_expression(assignments: Vec<(String, Value)>) -> Result<ExpressionInput> {
    let mut expressions = Vec::with_capacity(assignments.len() + 1);
    let mut expression_attribute_names = collections::HashMap::with_capacity(assignments.len() + 1);
    let mut expression_attribute_values =
        collections::HashMap::with_capacity(assignments.len() + 2);
    for (index, (name, value)) in assignments.into_iter().enumerate() {
        let name_placeholder = format!("#attr{index}");
        let value_placeholder = format!(":attr{index}");
        expressions.push(format!("{name_placeholder} = {value_placeholder}"));
        expression_attribute_names.insert(name_placeholder, name);
        expression_attribute_values.insert(value_placeholder, to_attribute_value(value)?);
    }
    let version_placeholder = format!("#{VERSION_ATTRIBUTE}");
    expressions.push(format!(
        "{version_placeholder} = if_not_exists({version_placeholder}, :zero) + :one"
    ));
    expression_attribute_names.insert(version_placeholder, VERSION_ATTRIBUTE.to_string());
    expression_attribute_values.insert(
        ":zero".to_string(),
        types::AttributeValue::N("0".to_string()),
    );
    expression_attribute_values.insert(
        ":one".to_string(),
        types::AttributeValue::N("1".to_string()),
    );
    Ok(ExpressionInput {
        expression: format!("SET {}", expressions.join(", ")),
        expression_attribute_names,
        expression_attribute_values,
    })
}

/// update record operation
#[derive(Clone, Debug, PartialEq)]
struct UpdateRecordInput {
    transaction: Transaction,
}

/// Apply a patch to an existing record, moving uniqueness guards along.
///
/// The record update comes first in the transaction. It only succeeds while the
/// record exists and still holds the unique values it was read with. Guard
/// releases follow, then guard reservations (see [`UpdateRecord::reserved_positions`]).
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UpdateRecord<'a> {
    pub(crate) current: &'a PokemonRecord,
    pub(crate) patch: &'a PokemonPatch,
    pub(crate) unique_attributes: &'a [String],
    pub(crate) table_name: &'a str,
}

impl UpdateRecord<'_> {
    /// Unique attributes whose value the patch changes.
    fn changed_attributes(&self) -> Vec<String> {
        let mut updated = self.current.clone();
        updated.apply(self.patch);
        self.unique_attributes
            .iter()
            .filter(|attribute| self.patch.touches(attribute))
            .filter(|attribute| {
                self.current.attribute(attribute) != updated.attribute(attribute)
            })
            .cloned()
            .collect()
    }

    /// Guards released by the patch, paired with the guards it reserves.
    fn guard_changes(&self) -> (Vec<UniqueGuard>, Vec<UniqueGuard>) {
        let changed = self.changed_attributes();
        let mut updated = self.current.clone();
        updated.apply(self.patch);
        (
            UniqueGuard::for_record(self.current, &changed),
            UniqueGuard::for_record(&updated, &changed),
        )
    }

    /// Guards newly reserved by the patch.
    pub(crate) fn reserved_guards(&self) -> Vec<UniqueGuard> {
        self.guard_changes().1
    }

    /// Position of each reserved guard's put within the transaction.
    pub(crate) fn reserved_positions(&self) -> Vec<usize> {
        let (released, reserved) = self.guard_changes();
        let first = 1 + released.len();
        (first..first + reserved.len()).collect()
    }
}

impl TryFrom<UpdateRecord<'_>> for UpdateRecordInput {
    type Error = serde_dynamo::Error;

    fn try_from(update_record: UpdateRecord<'_>) -> Result<Self> {
        let (released, reserved) = update_record.guard_changes();
        let mut conditions = vec![KeyCondition::new(PARTITION_KEY, Condition::Exists)];
        for guard in &released {
            conditions.push(KeyCondition::new(
                guard.attribute.clone(),
                Condition::Equals(guard.value.clone()),
            ));
        }
        let condition = KeyCondition::get_expression_operation(conditions)?;
        let update = get_set_expression(update_record.patch.assignments())?;
        let key = ItemKey::from(&update_record.current.id).into();
        let mut items = vec![TransactInput::Update(UpdateInput::new(key, update, condition))];
        let owner = &update_record.current.id;
        for guard in &released {
            items.push(guard.delete(owner)?);
        }
        for guard in &reserved {
            items.push(guard.put(owner)?);
        }
        let transaction = Transaction {
            items,
            table_name: update_record.table_name.to_string(),
        };
        Ok(Self { transaction })
    }
}

impl UpdateRecord<'_> {
    /// Execute the update operation.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<
        operation::transact_write_items::TransactWriteItemsOutput,
        error::SdkError<operation::transact_write_items::TransactWriteItemsError>,
    > {
        let update_record: UpdateRecordInput = self.try_into().map_err(error::BuildError::other)?;
        update_record.transaction.send(client).await
    }
}
