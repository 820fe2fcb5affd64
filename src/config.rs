//! Store and table configuration, loaded from environment variables.

use thiserror::Error;

/// Attribute that is unique regardless of configuration.
pub(crate) const NAME_ATTRIBUTE: &str = "name";

/// Attributes owned by the storage layer.
const STORAGE_ATTRIBUTES: [&str; 4] = ["id", "entity", "version", "owner"];

/// Page size used when a listing does not specify a limit.
pub const DEFAULT_LIMIT: usize = 7;

/// Settings read once at startup and injected into the store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    /// Number of records returned by a listing without an explicit limit.
    pub default_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl StoreConfig {
    /// Load from `DEFAULT_LIMIT`.
    ///
    /// Unparseable values fall back to the default; zero is rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env_var)
    }

    pub(crate) fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_limit = parse_usize(&vars, "DEFAULT_LIMIT", DEFAULT_LIMIT);
        if default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_LIMIT".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { default_limit })
    }
}

/// DynamoDB table layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    /// Table holding records and uniqueness guards.
    pub table_name: String,
    /// Index partitioned by `number`.
    pub number_index: String,
    /// Index partitioned by `entity` and sorted by `number`.
    pub listing_index: String,
    /// Attributes no two records may share. `name` is always among them.
    pub unique_attributes: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: "pokemon".to_string(),
            number_index: "number-index".to_string(),
            listing_index: "entity-number-index".to_string(),
            unique_attributes: vec![NAME_ATTRIBUTE.to_string()],
        }
    }
}

impl TableConfig {
    /// Load from `POKEMON_TABLE`, `POKEMON_NUMBER_INDEX`, `POKEMON_LISTING_INDEX`
    /// and `POKEMON_UNIQUE_ATTRIBUTES`.
    ///
    /// `POKEMON_UNIQUE_ATTRIBUTES` is a comma separated list of attributes that are
    /// unique in addition to `name`, which always is.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env_var)
    }

    pub(crate) fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let table_name = non_empty(&vars, "POKEMON_TABLE", defaults.table_name)?;
        let number_index = non_empty(&vars, "POKEMON_NUMBER_INDEX", defaults.number_index)?;
        let listing_index = non_empty(&vars, "POKEMON_LISTING_INDEX", defaults.listing_index)?;
        let mut unique_attributes = defaults.unique_attributes;
        if let Some(value) = vars("POKEMON_UNIQUE_ATTRIBUTES") {
            for attribute in parse_list(&value) {
                validate_attribute("POKEMON_UNIQUE_ATTRIBUTES", &attribute)?;
                unique_attributes.push(attribute);
            }
        }
        Ok(Self {
            table_name,
            number_index,
            listing_index,
            unique_attributes,
        }
        .normalized())
    }

    /// Put `name` first among the unique attributes and drop repeats.
    pub(crate) fn normalized(mut self) -> Self {
        let mut unique_attributes = vec![NAME_ATTRIBUTE.to_string()];
        for attribute in self.unique_attributes {
            if !unique_attributes.contains(&attribute) {
                unique_attributes.push(attribute);
            }
        }
        self.unique_attributes = unique_attributes;
        self
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Environment variable is set but empty.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable holds an unusable value.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: String,
) -> Result<String, ConfigError> {
    match vars(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(default),
    }
}

fn parse_usize(vars: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    vars(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Unique attributes are referenced as `#<attribute>` placeholders, which only
/// accept identifier characters, and cannot shadow storage attributes.
fn validate_attribute(key: &str, attribute: &str) -> Result<(), ConfigError> {
    let mut chars = attribute.chars();
    let identifier = chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !identifier {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("`{attribute}` is not a valid attribute name"),
        });
    }
    if STORAGE_ATTRIBUTES.contains(&attribute) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("`{attribute}` is reserved for storage"),
        });
    }
    Ok(())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    #[test]
    fn test_defaults() {
        assert_eq!(StoreConfig::default().default_limit, 7);
        let table = TableConfig::default();
        assert_eq!(table.table_name, "pokemon");
        assert_eq!(table.unique_attributes, vec!["name".to_string()]);
    }

    #[rstest]
    #[case::single("name", vec!["name"])]
    #[case::several(" name , number ", vec!["name", "number"])]
    #[case::blanks("name,,", vec!["name"])]
    #[case::empty("", vec![])]
    fn test_parse_list(#[case] value: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_list(value), expected);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: collections::HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| pairs.get(key).cloned()
    }

    #[rstest]
    #[case::unset(None, 7)]
    #[case::set(Some("12"), 12)]
    #[case::unparseable(Some("many"), 7)]
    fn test_default_limit(#[case] value: Option<&str>, #[case] expected: usize) {
        let pairs: Vec<(&str, &str)> = value.map(|v| ("DEFAULT_LIMIT", v)).into_iter().collect();
        let config = StoreConfig::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.default_limit, expected);
    }

    #[test]
    fn test_zero_default_limit_is_rejected() {
        assert!(matches!(
            StoreConfig::from_vars(vars(&[("DEFAULT_LIMIT", "0")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[rstest]
    #[case::unset(None, vec!["name"])]
    #[case::empty(Some(""), vec!["name"])]
    #[case::without_name(Some("number"), vec!["name", "number"])]
    #[case::with_name(Some("number, name"), vec!["name", "number"])]
    #[case::repeated(Some("species,species"), vec!["name", "species"])]
    fn test_unique_attributes_always_include_name(
        #[case] value: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let pairs: Vec<(&str, &str)> = value
            .map(|v| ("POKEMON_UNIQUE_ATTRIBUTES", v))
            .into_iter()
            .collect();
        let table = TableConfig::from_vars(vars(&pairs)).unwrap();
        assert_eq!(table.unique_attributes, expected);
    }

    #[rstest]
    #[case::hyphen("a-b")]
    #[case::space("national dex")]
    #[case::leading_digit("1st")]
    #[case::placeholder("#name")]
    #[case::storage("owner")]
    #[case::partition_key("id")]
    fn test_invalid_unique_attribute(#[case] attribute: &str) {
        assert!(matches!(
            TableConfig::from_vars(vars(&[("POKEMON_UNIQUE_ATTRIBUTES", attribute)])),
            Err(ConfigError::InvalidValue { key, .. }) if key == "POKEMON_UNIQUE_ATTRIBUTES"
        ));
    }

    #[test]
    fn test_empty_table_name_is_rejected() {
        assert_eq!(
            TableConfig::from_vars(vars(&[("POKEMON_TABLE", "  ")])),
            Err(ConfigError::EmptyValue("POKEMON_TABLE".to_string()))
        );
    }

    #[test]
    fn test_normalized_restores_name() {
        let table = TableConfig {
            unique_attributes: vec!["number".to_string()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(table.unique_attributes, vec!["name", "number"]);
    }
}
