use crate::config::TableConfig;
use crate::model::{PokemonPatch, PokemonRecord, RecordId};
use crate::repository::{DuplicateKeys, PokemonRepository, RepositoryError};
use crate::storage::batch_write::{BatchRequest, BatchWrite, BatchWriteReport};
use crate::storage::create_record::CreateRecord;
use crate::storage::delete_record::DeleteRecord;
use crate::storage::get_record::GetRecord;
use crate::storage::guard::{UniqueGuard, conflicts, owner_of};
use crate::storage::query_index::QueryIndex;
use crate::storage::key::ItemKey;
use crate::storage::scan_keys::ScanKeys;
use crate::storage::transact::{CONDITIONAL_CHECK_FAILED, cancellation_codes};
use crate::storage::update_record::UpdateRecord;
use crate::storage::{
    ENTITY_ATTRIBUTE, ENTITY_VALUE, Item, backend_error, item_to_record, record_to_item,
};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types};
use serde::Serialize;

type Result<T> = std::result::Result<T, RepositoryError>;

/// Whether the transaction item at `position` failed its condition.
fn failed_at(codes: &[String], position: usize) -> bool {
    codes
        .get(position)
        .is_some_and(|code| code == CONDITIONAL_CHECK_FAILED)
}

/// How a cancelled write transaction is reported.
#[derive(Debug, PartialEq)]
enum Cancellation {
    /// Guard puts failed: the values are held by another record.
    Duplicate(DuplicateKeys),
    /// The condition on the record itself, always first in the transaction, failed.
    RecordCondition,
    /// Anything else, reported as a backend error.
    Other,
}

/// Classify cancellation reason `codes` given the guards put at `positions`.
fn classify_cancellation(
    codes: &[String],
    guards: &[UniqueGuard],
    positions: &[usize],
) -> Cancellation {
    let duplicates = conflicts(guards, |index| {
        positions
            .get(index)
            .is_some_and(|position| failed_at(codes, *position))
    });
    if !duplicates.is_empty() {
        Cancellation::Duplicate(duplicates)
    } else if failed_at(codes, 0) {
        Cancellation::RecordCondition
    } else {
        Cancellation::Other
    }
}

/// After a failed record condition, `Ok` when the record is gone.
///
/// A record still present changed between the read and the write.
fn ensure_gone(operation: &str, id: &RecordId, current: Option<&PokemonRecord>) -> Result<()> {
    match current {
        None => Ok(()),
        Some(_) => Err(RepositoryError::Backend(format!(
            "{operation}: record {id} was modified concurrently"
        ))),
    }
}

fn is_record_item(item: &Item) -> bool {
    matches!(
        item.get(ENTITY_ATTRIBUTE),
        Some(types::AttributeValue::S(entity)) if entity == ENTITY_VALUE
    )
}

fn into_records(operation: &str, items: Vec<Item>) -> Result<Vec<PokemonRecord>> {
    items
        .into_iter()
        .map(item_to_record)
        .collect::<serde_dynamo::Result<_>>()
        .map_err(|error| backend_error(operation, error))
}

fn ensure_processed(operation: &str, report: BatchWriteReport) -> Result<()> {
    if report.unprocessed > 0 {
        return Err(RepositoryError::Backend(format!(
            "{operation}: {} requests left unprocessed after retries, {} written",
            report.unprocessed, report.written
        )));
    }
    Ok(())
}

/// [`PokemonRepository`] over a single DynamoDB table.
///
/// Records and uniqueness guards share the table. Names resolve through their
/// guard with consistent reads. Lookups by number and the ordered listing go
/// through the secondary indexes named in [`TableConfig`], which must project all
/// attributes.
#[derive(Clone, Debug)]
pub struct DynamoRepository {
    client: Client,
    table: TableConfig,
}

impl DynamoRepository {
    /// Repository over `table`, reached through `client`.
    ///
    /// `name` is added to the unique attributes when missing.
    pub fn new(client: Client, table: TableConfig) -> Self {
        Self {
            client,
            table: table.normalized(),
        }
    }

    /// The table layout in use.
    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    async fn find_one<T>(
        &self,
        operation: &str,
        index_name: &str,
        attribute: &str,
        value: T,
    ) -> Result<Option<PokemonRecord>>
    where
        T: Serialize + Send,
    {
        let items = QueryIndex {
            index_name,
            max_items: 1,
            partition_key_name: attribute,
            partition_key_value: value,
            scan_index_forward: true,
            table_name: &self.table.table_name,
        }
        .send(&self.client)
        .await
        .map_err(|error| backend_error(operation, error))?;
        Ok(into_records(operation, items)?.into_iter().next())
    }

    async fn get_item(
        &self,
        operation: &str,
        key: ItemKey,
        consistent_read: bool,
    ) -> Result<Option<Item>> {
        let output = GetRecord {
            consistent_read,
            key,
            table_name: &self.table.table_name,
        }
        .send(&self.client)
        .await
        .map_err(|error| backend_error(operation, error))?;
        Ok(output.item)
    }

    async fn fetch(
        &self,
        operation: &str,
        id: &RecordId,
        consistent_read: bool,
    ) -> Result<Option<PokemonRecord>> {
        match self.get_item(operation, id.into(), consistent_read).await? {
            Some(item) if is_record_item(&item) => item_to_record(item)
                .map(Some)
                .map_err(|error| backend_error(operation, error)),
            _ => Ok(None),
        }
    }

    async fn batch(&self, operation: &str, requests: Vec<BatchRequest>) -> Result<()> {
        let report = BatchWrite {
            requests,
            table_name: &self.table.table_name,
        }
        .send(&self.client)
        .await
        .map_err(|error| backend_error(operation, error))?;
        ensure_processed(operation, report)
    }
}

#[async_trait]
impl PokemonRepository for DynamoRepository {
    async fn insert(&self, record: &PokemonRecord) -> Result<()> {
        let create_record = CreateRecord {
            record,
            unique_attributes: &self.table.unique_attributes,
            table_name: &self.table.table_name,
        };
        let guards = create_record.guards();
        let positions = create_record.guard_positions();
        let error = match create_record.send(&self.client).await {
            Ok(_) => return Ok(()),
            Err(error) => error,
        };
        let codes = cancellation_codes(&error).unwrap_or_default();
        match classify_cancellation(&codes, &guards, &positions) {
            Cancellation::Duplicate(duplicates) => Err(RepositoryError::Duplicate(duplicates)),
            Cancellation::RecordCondition | Cancellation::Other => {
                Err(backend_error("insert", error))
            }
        }
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<PokemonRecord>> {
        let items = QueryIndex {
            index_name: &self.table.listing_index,
            max_items: offset.saturating_add(limit),
            partition_key_name: ENTITY_ATTRIBUTE,
            partition_key_value: ENTITY_VALUE,
            scan_index_forward: true,
            table_name: &self.table.table_name,
        }
        .send(&self.client)
        .await
        .map_err(|error| backend_error("list", error))?;
        let page = items.into_iter().skip(offset).collect();
        into_records("list", page)
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Option<PokemonRecord>> {
        self.fetch("get_by_id", id, false).await
    }

    async fn get_by_number(&self, number: u32) -> Result<Option<PokemonRecord>> {
        self.find_one("get_by_number", &self.table.number_index, "number", number)
            .await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonRecord>> {
        let guard = UniqueGuard::for_name(name);
        let Some(owner) = self
            .get_item("get_by_name", guard.key(), true)
            .await?
            .as_ref()
            .and_then(owner_of)
        else {
            return Ok(None);
        };
        let record = self.fetch("get_by_name", &owner, true).await?;
        Ok(record.filter(|record| record.name == name))
    }

    async fn update(&self, id: &RecordId, patch: &PokemonPatch) -> Result<Option<PokemonRecord>> {
        let Some(current) = self.fetch("update", id, true).await? else {
            return Ok(None);
        };
        let update_record = UpdateRecord {
            current: &current,
            patch,
            unique_attributes: &self.table.unique_attributes,
            table_name: &self.table.table_name,
        };
        let reserved = update_record.reserved_guards();
        let positions = update_record.reserved_positions();
        let error = match update_record.send(&self.client).await {
            Ok(_) => {
                let mut updated = current;
                updated.apply(patch);
                return Ok(Some(updated));
            }
            Err(error) => error,
        };
        let codes = cancellation_codes(&error).unwrap_or_default();
        let failure = backend_error("update", error);
        match classify_cancellation(&codes, &reserved, &positions) {
            Cancellation::Duplicate(duplicates) => Err(RepositoryError::Duplicate(duplicates)),
            Cancellation::RecordCondition => {
                let current = self.fetch("update", id, true).await?;
                ensure_gone("update", id, current.as_ref())?;
                Ok(None)
            }
            Cancellation::Other => Err(failure),
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        let Some(current) = self.fetch("delete", id, true).await? else {
            return Ok(false);
        };
        let error = match (DeleteRecord {
            current: &current,
            unique_attributes: &self.table.unique_attributes,
            table_name: &self.table.table_name,
        })
        .send(&self.client)
        .await
        {
            Ok(_) => return Ok(true),
            Err(error) => error,
        };
        let codes = cancellation_codes(&error).unwrap_or_default();
        let failure = backend_error("delete", error);
        match classify_cancellation(&codes, &[], &[]) {
            Cancellation::RecordCondition => {
                let current = self.fetch("delete", id, true).await?;
                ensure_gone("delete", id, current.as_ref())?;
                Ok(false)
            }
            Cancellation::Duplicate(_) | Cancellation::Other => Err(failure),
        }
    }

    async fn insert_many(&self, records: &[PokemonRecord]) -> Result<usize> {
        let mut requests = Vec::with_capacity(records.len() * (1 + self.table.unique_attributes.len()));
        for record in records {
            let item = record_to_item(record).map_err(|error| backend_error("insert_many", error))?;
            requests.push(BatchRequest::Put(item));
            for guard in UniqueGuard::for_record(record, &self.table.unique_attributes) {
                requests.push(BatchRequest::Put(guard.item(&record.id)));
            }
        }
        self.batch("insert_many", requests).await?;
        tracing::debug!(records = records.len(), "bulk inserted records");
        Ok(records.len())
    }

    async fn delete_all(&self) -> Result<usize> {
        let keys = ScanKeys {
            table_name: &self.table.table_name,
        }
        .send(&self.client)
        .await
        .map_err(|error| backend_error("delete_all", error))?;
        let records = keys
            .iter()
            .filter(|key| RecordId::parse(&key.0).is_some())
            .count();
        let requests = keys.into_iter().map(BatchRequest::Delete).collect();
        self.batch("delete_all", requests).await?;
        tracing::debug!(records, "deleted every record");
        Ok(records)
    }
}
