use crate::storage::key::{ItemKey, PARTITION_KEY};

use aws_sdk_dynamodb::{Client, error, operation};
use std::collections;

/// scan keys operation
#[derive(Clone, Debug, Default, PartialEq)]
struct ScanKeysInput {
    expression_attribute_names: collections::HashMap<String, String>,
    projection_expression: String,
    table_name: String,
}

/// Scan the whole table, projecting only the partition key.
///
/// Covers record items and guard items alike.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScanKeys<'a> {
    pub(crate) table_name: &'a str,
}

impl From<ScanKeys<'_>> for ScanKeysInput {
    fn from(scan: ScanKeys<'_>) -> Self {
        let placeholder = format!("#{PARTITION_KEY}");
        Self {
            expression_attribute_names: collections::HashMap::from([(
                placeholder.clone(),
                PARTITION_KEY.to_string(),
            )]),
            projection_expression: placeholder,
            table_name: scan.table_name.to_string(),
        }
    }
}

impl ScanKeys<'_> {
    /// Execute the scan, following every page.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> Result<Vec<ItemKey>, error::SdkError<operation::scan::ScanError>> {
        let scan: ScanKeysInput = self.into();
        let mut paginator = client
            .scan()
            .set_expression_attribute_names(Some(scan.expression_attribute_names))
            .projection_expression(scan.projection_expression)
            .table_name(scan.table_name)
            .into_paginator()
            .send();
        let mut keys = Vec::new();
        while let Some(page) = paginator.next().await {
            let items = page?.items.unwrap_or_default();
            keys.extend(items.iter().filter_map(ItemKey::from_item));
        }
        Ok(keys)
    }
}
