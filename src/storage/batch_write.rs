use crate::storage::Item;
use crate::storage::key::ItemKey;

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::time::Duration;

/// Most write requests DynamoDB accepts in one batch.
const MAX_BATCH_SIZE: usize = 25;

/// Sends per batch before unprocessed requests are given up on.
const MAX_ATTEMPTS: u32 = 5;

/// Delay before the first resend of unprocessed requests, doubled on every attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// A single request within a batch write.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BatchRequest {
    /// Put a whole item, replacing any item with the same key.
    Put(Item),
    /// Delete the item with the given key.
    Delete(ItemKey),
}

impl TryFrom<BatchRequest> for types::WriteRequest {
    type Error = error::BuildError;

    fn try_from(request: BatchRequest) -> Result<Self, Self::Error> {
        let builder = match request {
            BatchRequest::Put(item) => {
                let put_request = types::PutRequest::builder().set_item(Some(item)).build()?;
                Self::builder().put_request(put_request)
            }
            BatchRequest::Delete(key) => {
                let delete_request = types::DeleteRequest::builder()
                    .set_key(Some(key.into()))
                    .build()?;
                Self::builder().delete_request(delete_request)
            }
        };
        Ok(builder.build())
    }
}

/// Outcome of a batch write.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct BatchWriteReport {
    pub(crate) written: usize,
    pub(crate) unprocessed: usize,
}

/// batch write operation
#[derive(Clone, Debug, Default, PartialEq)]
struct BatchWriteInput {
    chunks: Vec<Vec<types::WriteRequest>>,
    table_name: String,
}

/// Write many items to one table, 25 requests at a time.
///
/// Unprocessed requests are resent with exponential backoff, up to a fixed number
/// of attempts; whatever is left is reported, not retried further.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BatchWrite<'a> {
    pub(crate) requests: Vec<BatchRequest>,
    pub(crate) table_name: &'a str,
}

impl TryFrom<BatchWrite<'_>> for BatchWriteInput {
    type Error = error::BuildError;

    fn try_from(batch_write: BatchWrite<'_>) -> Result<Self, Self::Error> {
        let mut chunks = Vec::with_capacity(batch_write.requests.len().div_ceil(MAX_BATCH_SIZE));
        let mut chunk = Vec::with_capacity(MAX_BATCH_SIZE);
        for request in batch_write.requests {
            chunk.push(request.try_into()?);
            if chunk.len() == MAX_BATCH_SIZE {
                chunks.push(std::mem::replace(
                    &mut chunk,
                    Vec::with_capacity(MAX_BATCH_SIZE),
                ));
            }
        }
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        Ok(Self {
            chunks,
            table_name: batch_write.table_name.to_string(),
        })
    }
}

impl BatchWrite<'_> {
    /// Execute the batch write.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> Result<
        BatchWriteReport,
        error::SdkError<operation::batch_write_item::BatchWriteItemError>,
    > {
        let batch_write: BatchWriteInput = self.try_into()?;
        let mut report = BatchWriteReport::default();
        for chunk in batch_write.chunks {
            let total = chunk.len();
            let mut pending = chunk;
            let mut attempt = 0;
            loop {
                let output = client
                    .batch_write_item()
                    .request_items(batch_write.table_name.clone(), pending)
                    .send()
                    .await?;
                pending = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(&batch_write.table_name))
                    .unwrap_or_default();
                attempt += 1;
                if pending.is_empty() || attempt == MAX_ATTEMPTS {
                    break;
                }
                tracing::debug!(
                    unprocessed = pending.len(),
                    attempt,
                    "resending unprocessed batch write requests"
                );
                tokio::time::sleep(BASE_BACKOFF * 2u32.pow(attempt - 1)).await;
            }
            report.written += total - pending.len();
            report.unprocessed += pending.len();
        }
        Ok(report)
    }
}
