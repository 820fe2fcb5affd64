//! Record fixtures.

use pokedex_store::config::StoreConfig;
use pokedex_store::model::NewPokemon;
use pokedex_store::store::EntityStore;
use serde_json::json;

use super::repository::InMemoryRepository;

/// Input for a Pokemon with the given name and number and no payload.
pub fn pokemon(name: &str, number: u32) -> NewPokemon {
    NewPokemon {
        name: name.to_string(),
        number,
        ..Default::default()
    }
}

/// Bulbasaur as a client would submit it.
pub fn bulbasaur() -> NewPokemon {
    serde_json::from_value(json!({
        "name": "Bulbasaur",
        "number": 1,
        "types": ["grass", "poison"],
    }))
    .expect("valid input")
}

/// Store over a fresh in-memory repository with the default configuration.
pub fn store() -> (EntityStore<InMemoryRepository>, InMemoryRepository) {
    let repository = InMemoryRepository::default();
    let store = EntityStore::new(repository.clone(), &StoreConfig::default());
    (store, repository)
}
