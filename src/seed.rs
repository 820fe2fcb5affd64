//! Populate the store from the public PokeAPI listing.

use crate::adapter::{AdapterError, HttpAdapter};
use crate::model::{NewPokemon, PokemonRecord, RecordId, normalize_name};
use crate::repository::{PokemonRepository, RepositoryError};

use serde::Deserialize;
use std::collections;
use thiserror::Error;

/// Listing fetched by [`Seeder::new`].
pub const POKEAPI_URL: &str = "https://pokeapi.co/api/v2/pokemon?limit=650";

/// Errors raised while seeding.
#[derive(Debug, Error, PartialEq)]
pub enum SeedError {
    /// The listing could not be fetched or decoded.
    #[error("failed to fetch pokemon listing: {0}")]
    Fetch(#[from] AdapterError),
    /// The repository rejected the reset or the bulk insert.
    #[error("failed to store seeded pokemon: {0}")]
    Storage(#[from] RepositoryError),
    /// A listing entry cannot be turned into a record.
    #[error("invalid listing entry {name:?}: {reason}")]
    InvalidEntry {
        /// Entry name as listed.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Named resource listing as served by PokeAPI.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PokeApiListing {
    /// Entries of the current page.
    pub results: Vec<PokeApiEntry>,
}

/// One named resource, e.g. `{"name": "bulbasaur", "url": ".../pokemon/1/"}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PokeApiEntry {
    /// Resource name.
    pub name: String,
    /// Resource url, ending with the Pokedex number.
    pub url: String,
}

impl PokeApiEntry {
    /// Pokedex number taken from the last path segment of the url.
    pub fn number(&self) -> Option<u32> {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

/// Turn listing entries into fresh records, rejecting unusable or repeated entries.
fn into_records(entries: Vec<PokeApiEntry>) -> Result<Vec<PokemonRecord>, SeedError> {
    let mut names = collections::HashSet::with_capacity(entries.len());
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(number) = entry.number() else {
            return Err(SeedError::InvalidEntry {
                reason: format!("no pokedex number in url {:?}", entry.url),
                name: entry.name,
            });
        };
        let name = normalize_name(&entry.name);
        if name.is_empty() {
            return Err(SeedError::InvalidEntry {
                name: entry.name,
                reason: "empty name".to_string(),
            });
        }
        if !names.insert(name.clone()) {
            return Err(SeedError::InvalidEntry {
                name: entry.name,
                reason: "listed more than once".to_string(),
            });
        }
        let input = NewPokemon {
            name,
            number,
            ..Default::default()
        };
        records.push(input.into_record(RecordId::generate()));
    }
    Ok(records)
}

/// Replaces every stored record with the PokeAPI listing.
///
/// ```rust,no_run
/// use pokedex_store::adapter::ReqwestAdapter;
/// use pokedex_store::config::TableConfig;
/// use pokedex_store::seed::Seeder;
/// use pokedex_store::storage::DynamoRepository;
///
/// # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), Box<dyn std::error::Error>> {
/// let repository = DynamoRepository::new(client, TableConfig::from_env()?);
/// let seeder = Seeder::new(repository, ReqwestAdapter::new()?);
/// let inserted = seeder.run().await?;
/// println!("seeded {inserted} pokemon");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Seeder<R, A> {
    repository: R,
    adapter: A,
    url: String,
}

impl<R, A> Seeder<R, A>
where
    R: PokemonRepository,
    A: HttpAdapter,
{
    /// Seeder reading [`POKEAPI_URL`].
    pub fn new(repository: R, adapter: A) -> Self {
        Self {
            repository,
            adapter,
            url: POKEAPI_URL.to_string(),
        }
    }

    /// Read the listing from `url` instead.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Wipe the store, fetch the listing and insert it, returning how many records were inserted.
    ///
    /// The listing is fetched and validated before anything is deleted.
    #[tracing::instrument(name = "pokedex_store.seed", skip(self), fields(url = %self.url))]
    pub async fn run(&self) -> Result<usize, SeedError> {
        let listing: PokeApiListing = self.adapter.get(&self.url).await?;
        let records = into_records(listing.results)?;
        let deleted = self.repository.delete_all().await?;
        let inserted = self.repository.insert_many(&records).await?;
        tracing::info!(deleted, inserted, "seeded pokemon");
        Ok(inserted)
    }
}
