use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Length of a record identifier: a v4 UUID rendered without hyphens.
const ID_LENGTH: usize = 32;

/// Attributes that belong to the storage layer and can never be set through a payload.
pub(crate) const RESERVED_ATTRIBUTES: [&str; 3] = ["id", "entity", "version"];

/// Check whether `value` is a syntactically valid record identifier.
///
/// Identifiers are exactly 32 lowercase hexadecimal characters.
///
/// ```rust
/// use pokedex_store::model;
///
/// assert!(model::is_valid_id("0f8fad5bd9cb469fa16570867728950e"));
/// assert!(!model::is_valid_id("pikachu"));
/// ```
pub fn is_valid_id(value: &str) -> bool {
    value.len() == ID_LENGTH
        && value
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

/// Lowercase and trim a name before it is stored or looked up.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check whether `name` is still non-empty once normalized.
///
/// Callers validate names with this before [`EntityStore::create`] and
/// [`EntityStore::update`]; a blank name reaches storage as an empty key and is
/// rejected there as `StorageUnavailable`.
///
/// [`EntityStore::create`]: crate::store::EntityStore::create
/// [`EntityStore::update`]: crate::store::EntityStore::update
///
/// ```rust
/// use pokedex_store::model;
///
/// assert!(model::is_valid_name(" Mew "));
/// assert!(!model::is_valid_name(" \t"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    !normalize_name(name).is_empty()
}

/// Opaque identifier assigned to a record when it is created.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse an identifier, returning `None` when `value` is not a valid id.
    pub fn parse(value: &str) -> Option<Self> {
        is_valid_id(value).then(|| Self(value.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_id(&value) {
            Ok(Self(value))
        } else {
            Err(format!("invalid record id `{value}`"))
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// A persisted Pokemon.
///
/// Descriptive fields other than `name` and `number` (types, abilities, stats, ...)
/// are kept as an opaque payload and flattened next to the identifying fields.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PokemonRecord {
    /// Identifier assigned at creation.
    pub id: RecordId,
    /// Lowercase, unique name.
    pub name: String,
    /// Human-facing Pokedex number.
    pub number: u32,
    /// Remaining descriptive fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl PokemonRecord {
    /// Value of a top-level attribute, as it would be stored.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "name" => Some(Value::String(self.name.clone())),
            "number" => Some(Value::from(self.number)),
            _ => self.payload.get(name).cloned(),
        }
    }

    /// Apply `patch` over this record. The id is never touched.
    pub fn apply(&mut self, patch: &PokemonPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(number) = patch.number {
            self.number = number;
        }
        for (key, value) in &patch.payload {
            self.payload.insert(key.clone(), value.clone());
        }
    }
}

/// Input for creating a record.
///
/// ```rust
/// use pokedex_store::model::NewPokemon;
/// use serde_json::json;
///
/// let input: NewPokemon = serde_json::from_value(json!({
///     "name": "Bulbasaur",
///     "number": 1,
///     "types": ["grass", "poison"],
/// }))
/// .unwrap();
/// assert_eq!(input.payload["types"], json!(["grass", "poison"]));
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NewPokemon {
    /// Name, normalized before storage. Must pass [`is_valid_name`].
    pub name: String,
    /// Pokedex number.
    pub number: u32,
    /// Remaining descriptive fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl NewPokemon {
    /// Build the record to persist under `id`.
    pub(crate) fn into_record(self, id: RecordId) -> PokemonRecord {
        PokemonRecord {
            id,
            name: normalize_name(&self.name),
            number: self.number,
            payload: without_reserved(self.payload),
        }
    }
}

/// Partial update of a record. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PokemonPatch {
    /// New name, normalized before storage. Must pass [`is_valid_name`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New Pokedex number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Descriptive fields to overwrite.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl PokemonPatch {
    /// Normalize the name and drop storage-owned attributes.
    pub(crate) fn normalized(self) -> Self {
        Self {
            name: self.name.as_deref().map(normalize_name),
            number: self.number,
            payload: without_reserved(self.payload),
        }
    }

    /// Whether the patch assigns the top-level attribute `name`.
    pub(crate) fn touches(&self, name: &str) -> bool {
        match name {
            "name" => self.name.is_some(),
            "number" => self.number.is_some(),
            _ => self.payload.contains_key(name),
        }
    }

    /// Attribute/value pairs written by this patch, in a stable order.
    pub(crate) fn assignments(&self) -> Vec<(String, Value)> {
        let mut assignments = Vec::with_capacity(self.payload.len() + 2);
        if let Some(name) = &self.name {
            assignments.push(("name".to_string(), Value::String(name.clone())));
        }
        if let Some(number) = self.number {
            assignments.push(("number".to_string(), Value::from(number)));
        }
        for (key, value) in &self.payload {
            assignments.push((key.clone(), value.clone()));
        }
        assignments
    }
}

/// Pagination for listing records.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pagination {
    /// Maximum number of records, the store default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of records to skip, 0 when absent.
    #[serde(default)]
    pub offset: Option<usize>,
}

fn without_reserved(mut payload: Map<String, Value>) -> Map<String, Value> {
    for attribute in RESERVED_ATTRIBUTES {
        payload.remove(attribute);
    }
    payload
}
