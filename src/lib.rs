#![deny(missing_docs)]

//! # Pokedex store
//!
//! A typed CRUD store for Pokemon records backed by Amazon DynamoDB.
//!
//! ## Overview
//!
//! [`store::EntityStore`] is the single entry point:
//! - `create` stores a new record under a generated id, rejecting taken names
//! - `list` pages through records in Pokedex order
//! - `find_by_term` resolves an id, a Pokedex number or a name, in that order
//! - `update` applies a partial patch and returns the new state
//! - `remove` deletes a record by id
//!
//! Names are trimmed and lowercased before they are stored or looked up, so
//! `"Pikachu"` and `"pikachu"` denote the same record.
//!
//! Persistence goes through the [`repository::PokemonRepository`] port.
//! [`storage::DynamoRepository`] implements it on a single table, enforcing
//! uniqueness with guard items written in the same transaction as the record.
//!
//! ## Quick Example
//!
//! ```no_run
//! use pokedex_store::config::{StoreConfig, TableConfig};
//! use pokedex_store::model::{Pagination, PokemonPatch};
//! use pokedex_store::storage::DynamoRepository;
//! use pokedex_store::store::{EntityStore, StoreError};
//!
//! # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), Box<dyn std::error::Error>> {
//! let repository = DynamoRepository::new(client, TableConfig::from_env()?);
//! let store = EntityStore::new(repository, &StoreConfig::from_env()?);
//!
//! // first `default_limit` records, ascending by number
//! let page = store.list(Pagination::default()).await?;
//!
//! let pikachu = store.find_by_term("Pikachu").await?;
//! let raichu = store
//!     .update(
//!         pikachu.id.as_str(),
//!         PokemonPatch {
//!             name: Some("Raichu".to_string()),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! assert_eq!(raichu.id, pikachu.id);
//!
//! store.remove(raichu.id.as_str()).await?;
//! assert!(matches!(
//!     store.remove(raichu.id.as_str()).await,
//!     Err(StoreError::NotFound { .. })
//! ));
//! # let _ = page;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Operations emit `tracing` spans named `pokedex_store.<operation>`. Backend
//! failures are logged with their full diagnostic before being reported as
//! [`store::StoreError::StorageUnavailable`]. No subscriber is installed.

/// Outbound HTTP fetch capability used by seeding.
pub mod adapter;

/// Store and table configuration.
pub mod config;

/// Records, inputs and identifiers.
pub mod model;

/// Persistence port.
pub mod repository;

/// Store population from PokeAPI.
pub mod seed;

/// DynamoDB implementation of the persistence port.
pub mod storage;

/// The entity store and its errors.
pub mod store;
