//! Persistence port for Pokemon records.
//!
//! The store only talks to this trait; [`crate::storage::DynamoRepository`] is the
//! production implementation.

use crate::model::{PokemonPatch, PokemonRecord, RecordId};

use async_trait::async_trait;
use serde_json::Value;
use std::collections;
use thiserror::Error;

/// Attribute/value pairs that collided with an existing record.
pub type DuplicateKeys = collections::BTreeMap<String, Value>;

/// Errors reported by a repository.
#[derive(Debug, Error, PartialEq)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated on {0:?}")]
    Duplicate(DuplicateKeys),
    /// The backend failed for any other reason. Carries the full diagnostic.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Repository for Pokemon persistence.
///
/// Every write is atomic on its own; no method spans more than one record
/// except the bulk helpers used for seeding.
#[async_trait]
pub trait PokemonRepository: Send + Sync {
    /// Insert a new record.
    ///
    /// Returns `Err(RepositoryError::Duplicate)` when a unique attribute is taken.
    async fn insert(&self, record: &PokemonRecord) -> Result<(), RepositoryError>;

    /// Records ordered ascending by `number`, skipping `offset` and returning at most `limit`.
    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PokemonRecord>, RepositoryError>;

    /// Record with the given id.
    async fn get_by_id(&self, id: &RecordId) -> Result<Option<PokemonRecord>, RepositoryError>;

    /// First record with the given number.
    async fn get_by_number(&self, number: u32) -> Result<Option<PokemonRecord>, RepositoryError>;

    /// Record with the given (already normalized) name.
    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonRecord>, RepositoryError>;

    /// Apply `patch` to the record and return its new state, `None` if it does not exist.
    async fn update(
        &self,
        id: &RecordId,
        patch: &PokemonPatch,
    ) -> Result<Option<PokemonRecord>, RepositoryError>;

    /// Delete the record, returning whether anything was deleted.
    async fn delete(&self, id: &RecordId) -> Result<bool, RepositoryError>;

    /// Insert records in bulk without per-record uniqueness checks.
    async fn insert_many(&self, records: &[PokemonRecord]) -> Result<usize, RepositoryError>;

    /// Delete every record, returning how many records were removed.
    async fn delete_all(&self) -> Result<usize, RepositoryError>;
}
