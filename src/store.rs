//! Record store: create, list, flexible lookup, update and delete.
//!
//! # Invariants
//! - Names are lowercased and trimmed before they are stored or looked up.
//! - Every failure is exactly one [`StoreError`] kind; backend detail is logged,
//!   never returned.
//! - No operation retries internally.

use crate::config::StoreConfig;
use crate::model::{self, NewPokemon, Pagination, PokemonPatch, PokemonRecord, RecordId};
use crate::repository::{DuplicateKeys, PokemonRepository, RepositoryError};

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to callers of [`EntityStore`].
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// A unique attribute is already owned by another record.
    #[error("pokemon already exists with {}", format_keys(.keys))]
    DuplicateKey {
        /// The conflicting attribute/value pairs.
        keys: DuplicateKeys,
    },
    /// Nothing matches the given term or id.
    #[error("pokemon `{term}` not found")]
    NotFound {
        /// The term as supplied by the caller.
        term: String,
    },
    /// Storage failed; details are in the server logs.
    #[error("storage is unavailable, check server logs")]
    StorageUnavailable,
}

impl StoreError {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DuplicateKey { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::StorageUnavailable => 500,
        }
    }

    fn not_found(term: &str) -> Self {
        tracing::debug!(term, "no pokemon matches term");
        Self::NotFound {
            term: term.to_string(),
        }
    }

    fn from_repository(operation: &'static str, error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate(keys) => {
                tracing::debug!(operation, ?keys, "unique constraint rejected write");
                Self::DuplicateKey { keys }
            }
            RepositoryError::Backend(detail) => {
                tracing::error!(operation, %detail, "storage backend failure");
                Self::StorageUnavailable
            }
        }
    }
}

fn format_keys(keys: &DuplicateKeys) -> String {
    keys.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Store owning all access to Pokemon records.
///
/// ```rust,no_run
/// use pokedex_store::config::{StoreConfig, TableConfig};
/// use pokedex_store::model::NewPokemon;
/// use pokedex_store::storage::DynamoRepository;
/// use pokedex_store::store::EntityStore;
///
/// # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), Box<dyn std::error::Error>> {
/// let repository = DynamoRepository::new(client, TableConfig::from_env()?);
/// let store = EntityStore::new(repository, &StoreConfig::from_env()?);
/// let bulbasaur = store
///     .create(NewPokemon {
///         name: "Bulbasaur".to_string(),
///         number: 1,
///         ..Default::default()
///     })
///     .await?;
/// assert_eq!(store.find_by_term("1").await?, bulbasaur);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EntityStore<R> {
    repository: R,
    default_limit: usize,
}

impl<R: PokemonRepository> EntityStore<R> {
    /// Create a store over `repository`.
    pub fn new(repository: R, config: &StoreConfig) -> Self {
        Self {
            repository,
            default_limit: config.default_limit,
        }
    }

    /// The page size applied when a listing has no limit.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Persist a new record under a fresh id.
    ///
    /// `input.name` must pass [`model::is_valid_name`]; blank names are not
    /// rejected here and fail in storage.
    #[tracing::instrument(name = "pokedex_store.create", skip_all, fields(name = %input.name))]
    pub async fn create(&self, input: NewPokemon) -> StoreResult<PokemonRecord> {
        debug_assert!(model::is_valid_name(&input.name), "blank name");
        let record = input.into_record(RecordId::generate());
        self.repository
            .insert(&record)
            .await
            .map_err(|error| StoreError::from_repository("create", error))?;
        Ok(record)
    }

    /// Records ordered ascending by number.
    #[tracing::instrument(name = "pokedex_store.list", skip(self))]
    pub async fn list(&self, pagination: Pagination) -> StoreResult<Vec<PokemonRecord>> {
        let limit = pagination.limit.unwrap_or(self.default_limit);
        let offset = pagination.offset.unwrap_or(0);
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.repository
            .list(limit, offset)
            .await
            .map_err(|error| StoreError::from_repository("list", error))
    }

    /// Resolve one record from an id, a number or a name.
    ///
    /// A term that is a valid id and matches a record resolves by id, even when it
    /// could also be read as a number. Otherwise numeric terms resolve by number,
    /// and anything left resolves by normalized name.
    #[tracing::instrument(name = "pokedex_store.find_by_term", skip(self))]
    pub async fn find_by_term(&self, term: &str) -> StoreResult<PokemonRecord> {
        let map_error = |error| StoreError::from_repository("find_by_term", error);
        if let Some(id) = RecordId::parse(term) {
            if let Some(record) = self.repository.get_by_id(&id).await.map_err(map_error)? {
                return Ok(record);
            }
        }
        if let Ok(number) = term.trim().parse::<u32>() {
            if let Some(record) = self
                .repository
                .get_by_number(number)
                .await
                .map_err(map_error)?
            {
                return Ok(record);
            }
        }
        let name = model::normalize_name(term);
        if !name.is_empty() {
            if let Some(record) = self.repository.get_by_name(&name).await.map_err(map_error)? {
                return Ok(record);
            }
        }
        Err(StoreError::not_found(term))
    }

    /// Apply `patch` to the record with the given id and return its new state.
    ///
    /// A name in `patch` must pass [`model::is_valid_name`].
    #[tracing::instrument(name = "pokedex_store.update", skip(self, patch))]
    pub async fn update(&self, id: &str, patch: PokemonPatch) -> StoreResult<PokemonRecord> {
        debug_assert!(
            patch.name.as_deref().is_none_or(model::is_valid_name),
            "blank name"
        );
        let Some(record_id) = RecordId::parse(id) else {
            return Err(StoreError::not_found(id));
        };
        self.repository
            .update(&record_id, &patch.normalized())
            .await
            .map_err(|error| StoreError::from_repository("update", error))?
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Delete the record with the given id.
    #[tracing::instrument(name = "pokedex_store.remove", skip(self))]
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        let Some(record_id) = RecordId::parse(id) else {
            return Err(StoreError::not_found(id));
        };
        let deleted = self
            .repository
            .delete(&record_id)
            .await
            .map_err(|error| StoreError::from_repository("remove", error))?;
        if deleted {
            Ok(())
        } else {
            Err(StoreError::not_found(id))
        }
    }
}
