use crate::storage::condition::{Condition, KeyCondition};
use crate::storage::{ExpressionInput, Item};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::Result;

/// Upper bound on items requested per page.
const MAX_PAGE_SIZE: usize = 100;

/// query index operation
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryIndexInput {
    index_name: String,
    key_condition: ExpressionInput,
    max_items: usize,
    page_size: i32,
    scan_index_forward: bool,
    table_name: String,
}

/// Query a secondary index for the items sharing one partition key value.
///
/// Pages are fetched until `max_items` items are collected or the index is exhausted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QueryIndex<'a, T> {
    pub(crate) index_name: &'a str,
    pub(crate) max_items: usize,
    pub(crate) partition_key_name: &'a str,
    pub(crate) partition_key_value: T,
    /// Ascending sort key order when `true`.
    pub(crate) scan_index_forward: bool,
    pub(crate) table_name: &'a str,
}

impl<T: Serialize> TryFrom<QueryIndex<'_, T>> for QueryIndexInput {
    type Error = serde_dynamo::Error;

    fn try_from(query: QueryIndex<'_, T>) -> Result<Self> {
        let key_condition = KeyCondition::get_expression_operation(vec![KeyCondition::new(
            query.partition_key_name,
            Condition::Equals(query.partition_key_value),
        )])?;
        let page_size = query.max_items.clamp(1, MAX_PAGE_SIZE) as i32;
        let operation = Self {
            index_name: query.index_name.to_string(),
            key_condition,
            max_items: query.max_items,
            page_size,
            scan_index_forward: query.scan_index_forward,
            table_name: query.table_name.to_string(),
        };
        Ok(operation)
    }
}

impl<T: Serialize> QueryIndex<'_, T> {
    /// Execute the query, returning at most `max_items` items.
    pub(crate) async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<Vec<Item>, error::SdkError<operation::query::QueryError>> {
        let query: QueryIndexInput = self.try_into().map_err(error::BuildError::other)?;
        if query.max_items == 0 {
            return Ok(Vec::new());
        }
        let (key_condition_expression, names, values) = query.key_condition.into_parts();
        let mut paginator = client
            .query()
            .index_name(query.index_name)
            .key_condition_expression(key_condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .limit(query.page_size)
            .scan_index_forward(query.scan_index_forward)
            .table_name(query.table_name)
            .into_paginator()
            .send();
        let mut items = Vec::new();
        while items.len() < query.max_items {
            match paginator.next().await {
                Some(page) => items.extend(page?.items.unwrap_or_default()),
                None => break,
            }
        }
        items.truncate(query.max_items);
        Ok(items)
    }
}
