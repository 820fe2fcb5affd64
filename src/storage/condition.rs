use crate::storage::ExpressionInput;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Result, to_attribute_value};
use std::collections;

const AND: &str = " AND ";
const OR: &str = " OR ";

/// Condition on a single attribute.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Condition<T> {
    /// The attribute equals the value.
    Equals(T),
    /// The attribute is present.
    Exists,
    /// The attribute is absent.
    NotExists,
}

impl<T: Serialize> Condition<T> {
    fn get_expression(
        self,
        key: &str,
        key_placeholder: &str,
        index: &mut usize,
    ) -> Result<(String, collections::HashMap<String, types::AttributeValue>)> {
        let mut expression_attribute_values = collections::HashMap::new();
        let expression = match self {
            Self::Equals(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{}_eq{}", key, index);
                *index += 1;
                let expression = format!("{} = {}", key_placeholder, value_placeholder);
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::Exists => format!("attribute_exists({})", key_placeholder),
            Self::NotExists => format!("attribute_not_exists({})", key_placeholder),
        };
        Ok((expression, expression_attribute_values))
    }
}

/// Condition applied to an attribute.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KeyCondition<T> {
    pub(crate) condition: Condition<T>,
    pub(crate) name: String,
}

impl<T> KeyCondition<T> {
    pub(crate) fn new(name: impl Into<String>, condition: Condition<T>) -> Self {
        Self {
            condition,
            name: name.into(),
        }
    }
}

impl<T: Serialize> KeyCondition<T> {
    /// Combine conditions with AND.
    ///
    /// Attribute names are referenced through `#`-prefixed placeholders, so only
    /// fixed, identifier-like attribute names belong here.
    pub(crate) fn get_expression_operation(keys: Vec<Self>) -> Result<ExpressionInput> {
        Self::join(keys, AND)
    }

    /// Combine conditions with OR.
    pub(crate) fn get_any_expression_operation(keys: Vec<Self>) -> Result<ExpressionInput> {
        Self::join(keys, OR)
    }

    fn join(keys: Vec<Self>, operator: &str) -> Result<ExpressionInput> {
        let mut expressions = Vec::with_capacity(keys.len());
        let mut expression_attribute_names = collections::HashMap::with_capacity(keys.len());
        let mut expression_attribute_values = collections::HashMap::new();
        let mut index = 0;
        for key in keys {
            let placeholder = format!("#{}", key.name);
            let (expression, condition_expression_attribute_values) = key
                .condition
                .get_expression(&key.name, &placeholder, &mut index)?;
            expressions.push(expression);
            expression_attribute_names.insert(placeholder, key.name);
            expression_attribute_values.extend(condition_expression_attribute_values);
        }
        let expression = expressions.join(operator);
        let operation = ExpressionInput {
            expression,
            expression_attribute_names,
            expression_attribute_values,
        };
        Ok(operation)
    }
}
