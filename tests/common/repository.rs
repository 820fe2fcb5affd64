//! In-memory repository enforcing name uniqueness.

use async_trait::async_trait;
use pokedex_store::model::{PokemonPatch, PokemonRecord, RecordId};
use pokedex_store::repository::{DuplicateKeys, PokemonRepository, RepositoryError};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    records: Vec<PokemonRecord>,
    failure: Option<String>,
}

/// Repository keeping records in insertion order behind a shared lock.
///
/// Clones share state, so a test can keep a handle after moving one into a store.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    /// Make every following call fail with a backend error carrying `message`.
    pub fn fail_with(&self, message: &str) {
        self.lock().failure = Some(message.to_string());
    }

    /// Snapshot of the stored records, in insertion order.
    pub fn records(&self) -> Vec<PokemonRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("repository lock")
    }

    fn check(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        let state = self.lock();
        match &state.failure {
            Some(message) => Err(RepositoryError::Backend(message.clone())),
            None => Ok(state),
        }
    }
}

fn name_taken(records: &[PokemonRecord], name: &str, except: Option<&RecordId>) -> bool {
    records
        .iter()
        .any(|record| record.name == name && Some(&record.id) != except)
}

fn duplicate_name(name: &str) -> RepositoryError {
    RepositoryError::Duplicate(DuplicateKeys::from([(
        "name".to_string(),
        Value::String(name.to_string()),
    )]))
}

fn sorted(records: &[PokemonRecord]) -> Vec<PokemonRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.number);
    sorted
}

#[async_trait]
impl PokemonRepository for InMemoryRepository {
    async fn insert(&self, record: &PokemonRecord) -> Result<(), RepositoryError> {
        let mut state = self.check()?;
        if name_taken(&state.records, &record.name, None) {
            return Err(duplicate_name(&record.name));
        }
        state.records.push(record.clone());
        Ok(())
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PokemonRecord>, RepositoryError> {
        let state = self.check()?;
        Ok(sorted(&state.records)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Option<PokemonRecord>, RepositoryError> {
        let state = self.check()?;
        Ok(state.records.iter().find(|record| &record.id == id).cloned())
    }

    async fn get_by_number(&self, number: u32) -> Result<Option<PokemonRecord>, RepositoryError> {
        let state = self.check()?;
        Ok(state
            .records
            .iter()
            .find(|record| record.number == number)
            .cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonRecord>, RepositoryError> {
        let state = self.check()?;
        Ok(state.records.iter().find(|record| record.name == name).cloned())
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &PokemonPatch,
    ) -> Result<Option<PokemonRecord>, RepositoryError> {
        let mut state = self.check()?;
        if let Some(name) = &patch.name {
            if name_taken(&state.records, name, Some(id)) {
                return Err(duplicate_name(name));
            }
        }
        let Some(record) = state.records.iter_mut().find(|record| &record.id == id) else {
            return Ok(None);
        };
        record.apply(patch);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, RepositoryError> {
        let mut state = self.check()?;
        let before = state.records.len();
        state.records.retain(|record| &record.id != id);
        Ok(state.records.len() < before)
    }

    async fn insert_many(&self, records: &[PokemonRecord]) -> Result<usize, RepositoryError> {
        let mut state = self.check()?;
        state.records.extend_from_slice(records);
        Ok(records.len())
    }

    async fn delete_all(&self) -> Result<usize, RepositoryError> {
        let mut state = self.check()?;
        let deleted = state.records.len();
        state.records.clear();
        Ok(deleted)
    }
}
