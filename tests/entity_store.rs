//! EntityStore behaviour against the in-memory repository.

mod common;

use common::fixtures::{bulbasaur, pokemon, store};
use common::repository::InMemoryRepository;
use pokedex_store::config::StoreConfig;
use pokedex_store::model::{self, Pagination, PokemonPatch, PokemonRecord, RecordId};
use pokedex_store::repository::{DuplicateKeys, PokemonRepository};
use pokedex_store::store::{EntityStore, StoreError};
use rstest::rstest;
use serde_json::{Map, json};

fn names(records: &[PokemonRecord]) -> Vec<&str> {
    records.iter().map(|record| record.name.as_str()).collect()
}

#[tokio::test]
async fn test_create_normalizes_and_assigns_id() {
    let (store, repository) = store();
    let created = store.create(bulbasaur()).await.unwrap();
    assert!(model::is_valid_id(created.id.as_str()));
    assert_eq!(created.name, "bulbasaur");
    assert_eq!(created.number, 1);
    assert_eq!(created.payload["types"], json!(["grass", "poison"]));
    assert_eq!(repository.records(), vec![created]);
}

#[tokio::test]
async fn test_create_rejects_name_in_other_case() {
    let (store, repository) = store();
    store.create(pokemon("Pikachu", 25)).await.unwrap();
    let error = store.create(pokemon("pikachu", 26)).await.unwrap_err();
    assert_eq!(
        error,
        StoreError::DuplicateKey {
            keys: DuplicateKeys::from([("name".to_string(), json!("pikachu"))]),
        }
    );
    assert_eq!(error.status_code(), 400);
    assert_eq!(repository.records().len(), 1);
}

#[tokio::test]
async fn test_create_drops_reserved_payload_attributes() {
    let (store, _) = store();
    let mut input = pokemon("mew", 151);
    input.payload = Map::from_iter([
        ("entity".to_string(), json!("trainer")),
        ("version".to_string(), json!(9)),
        ("color".to_string(), json!("pink")),
    ]);
    let created = store.create(input).await.unwrap();
    assert_eq!(
        created.payload,
        Map::from_iter([("color".to_string(), json!("pink"))])
    );
}

#[rstest]
#[case::empty("")]
#[case::spaces("   ")]
#[cfg(debug_assertions)]
#[should_panic(expected = "blank name")]
#[tokio::test]
async fn test_create_blank_name_is_a_caller_error(#[case] name: &str) {
    let (store, _) = store();
    let _ = store.create(pokemon(name, 25)).await;
}

#[cfg(debug_assertions)]
#[should_panic(expected = "blank name")]
#[tokio::test]
async fn test_update_to_blank_name_is_a_caller_error() {
    let (store, _) = store();
    let pikachu = store.create(pokemon("pikachu", 25)).await.unwrap();
    let patch = PokemonPatch {
        name: Some(" ".to_string()),
        ..Default::default()
    };
    let _ = store.update(pikachu.id.as_str(), patch).await;
}

#[rstest]
#[case::lowercase("pikachu")]
#[case::uppercase("PIKACHU")]
#[case::padded("  Pikachu ")]
#[case::number("25")]
#[case::padded_number(" 25 ")]
#[tokio::test]
async fn test_find_by_term(#[case] term: &str) {
    let (store, _) = store();
    let pikachu = store.create(pokemon("Pikachu", 25)).await.unwrap();
    assert_eq!(store.find_by_term(term).await.unwrap(), pikachu);
}

#[tokio::test]
async fn test_find_by_id() {
    let (store, _) = store();
    let pikachu = store.create(pokemon("pikachu", 25)).await.unwrap();
    assert_eq!(
        store.find_by_term(pikachu.id.as_str()).await.unwrap(),
        pikachu
    );
}

#[tokio::test]
async fn test_find_prefers_id_over_other_readings() {
    let (store, repository) = store();
    let id = "12345678901234567890123456789012";
    let by_id = PokemonRecord {
        id: RecordId::parse(id).unwrap(),
        name: "porygon".to_string(),
        number: 137,
        payload: Map::new(),
    };
    let by_name = PokemonRecord {
        id: RecordId::generate(),
        name: id.to_string(),
        number: 138,
        payload: Map::new(),
    };
    repository
        .insert_many(&[by_name.clone(), by_id.clone()])
        .await
        .unwrap();
    assert_eq!(store.find_by_term(id).await.unwrap(), by_id);
}

#[tokio::test]
async fn test_find_falls_back_when_id_misses() {
    let (store, repository) = store();
    let term = "0f8fad5bd9cb469fa16570867728950e";
    let named = PokemonRecord {
        id: RecordId::generate(),
        name: term.to_string(),
        number: 7,
        payload: Map::new(),
    };
    repository.insert(&named).await.unwrap();
    assert_eq!(store.find_by_term(term).await.unwrap(), named);
}

#[rstest]
#[case::unknown_name("missingno")]
#[case::unknown_number("9999")]
#[case::unknown_id("0f8fad5bd9cb469fa16570867728950e")]
#[case::blank("   ")]
#[tokio::test]
async fn test_find_not_found(#[case] term: &str) {
    let (store, _) = store();
    store.create(pokemon("pikachu", 25)).await.unwrap();
    let error = store.find_by_term(term).await.unwrap_err();
    assert_eq!(
        error,
        StoreError::NotFound {
            term: term.to_string()
        }
    );
    assert_eq!(error.status_code(), 404);
}

#[tokio::test]
async fn test_list_defaults_to_first_page_by_number() {
    let (store, _) = store();
    for number in (1..=10).rev() {
        store
            .create(pokemon(&format!("pokemon{number}"), number))
            .await
            .unwrap();
    }
    let page = store.list(Pagination::default()).await.unwrap();
    assert_eq!(page.len(), store.default_limit());
    let numbers: Vec<u32> = page.iter().map(|record| record.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[rstest]
#[case::limit(Some(2), None, vec!["bulbasaur", "ivysaur"])]
#[case::offset(None, Some(2), vec!["venusaur", "charmander"])]
#[case::limit_and_offset(Some(1), Some(3), vec!["charmander"])]
#[case::zero_limit(Some(0), None, vec![])]
#[case::past_the_end(Some(5), Some(10), vec![])]
#[tokio::test]
async fn test_list_pagination(
    #[case] limit: Option<usize>,
    #[case] offset: Option<usize>,
    #[case] expected: Vec<&str>,
) {
    let (store, _) = store();
    for (name, number) in [
        ("charmander", 4),
        ("venusaur", 3),
        ("bulbasaur", 1),
        ("ivysaur", 2),
    ] {
        store.create(pokemon(name, number)).await.unwrap();
    }
    let page = store.list(Pagination { limit, offset }).await.unwrap();
    assert_eq!(names(&page), expected);
}

#[tokio::test]
async fn test_list_uses_configured_default_limit() {
    let repository = InMemoryRepository::default();
    let store = EntityStore::new(repository, &StoreConfig { default_limit: 3 });
    for number in 1..=5 {
        store
            .create(pokemon(&format!("pokemon{number}"), number))
            .await
            .unwrap();
    }
    assert_eq!(store.list(Pagination::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_keeps_id() {
    let (store, _) = store();
    let pikachu = store.create(pokemon("pikachu", 25)).await.unwrap();
    let raichu = store
        .update(
            pikachu.id.as_str(),
            PokemonPatch {
                name: Some("Raichu".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(raichu.id, pikachu.id);
    assert_eq!(raichu.name, "raichu");
    assert_eq!(raichu.number, 25);
    assert_eq!(store.find_by_term("raichu").await.unwrap(), raichu);
    assert!(matches!(
        store.find_by_term("pikachu").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_update_merges_payload() {
    let (store, _) = store();
    let created = store.create(bulbasaur()).await.unwrap();
    let updated = store
        .update(
            created.id.as_str(),
            serde_json::from_value(json!({"height": 7, "number": 2})).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "bulbasaur");
    assert_eq!(updated.number, 2);
    assert_eq!(updated.payload["types"], json!(["grass", "poison"]));
    assert_eq!(updated.payload["height"], json!(7));
}

#[tokio::test]
async fn test_update_rejects_taken_name() {
    let (store, _) = store();
    store.create(pokemon("pikachu", 25)).await.unwrap();
    let raichu = store.create(pokemon("raichu", 26)).await.unwrap();
    let error = store
        .update(
            raichu.id.as_str(),
            PokemonPatch {
                name: Some("PIKACHU".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, StoreError::DuplicateKey { .. }));
    assert_eq!(store.find_by_term("26").await.unwrap(), raichu);
}

#[rstest]
#[case::malformed_id("pikachu")]
#[case::unknown_id("0f8fad5bd9cb469fa16570867728950e")]
#[tokio::test]
async fn test_update_not_found(#[case] id: &str) {
    let (store, _) = store();
    store.create(pokemon("pikachu", 25)).await.unwrap();
    let error = store
        .update(id, PokemonPatch::default())
        .await
        .unwrap_err();
    assert_eq!(
        error,
        StoreError::NotFound {
            term: id.to_string()
        }
    );
}

#[tokio::test]
async fn test_remove_twice() {
    let (store, repository) = store();
    let pikachu = store.create(pokemon("pikachu", 25)).await.unwrap();
    store.remove(pikachu.id.as_str()).await.unwrap();
    assert!(repository.records().is_empty());
    assert_eq!(
        store.remove(pikachu.id.as_str()).await.unwrap_err(),
        StoreError::NotFound {
            term: pikachu.id.to_string()
        }
    );
}

#[tokio::test]
async fn test_remove_malformed_id() {
    let (store, _) = store();
    store.create(pokemon("pikachu", 25)).await.unwrap();
    assert!(matches!(
        store.remove("25").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_backend_failure_is_storage_unavailable() {
    let (store, repository) = store();
    let pikachu = store.create(pokemon("pikachu", 25)).await.unwrap();
    repository.fail_with("connection reset by peer");
    let errors = vec![
        store.create(pokemon("mew", 151)).await.unwrap_err(),
        store.list(Pagination::default()).await.unwrap_err(),
        store.find_by_term("pikachu").await.unwrap_err(),
        store
            .update(pikachu.id.as_str(), PokemonPatch::default())
            .await
            .unwrap_err(),
        store.remove(pikachu.id.as_str()).await.unwrap_err(),
    ];
    for error in errors {
        assert_eq!(error, StoreError::StorageUnavailable);
        assert_eq!(error.status_code(), 500);
        assert!(!error.to_string().contains("connection reset"));
    }
}

#[tokio::test]
async fn test_bulbasaur_lifecycle() {
    let (store, _) = store();
    let created = store.create(bulbasaur()).await.unwrap();
    assert!(matches!(
        store.create(bulbasaur()).await,
        Err(StoreError::DuplicateKey { .. })
    ));
    assert_eq!(store.find_by_term("1").await.unwrap(), created);
    store.remove(created.id.as_str()).await.unwrap();
    assert_eq!(
        store.find_by_term("bulbasaur").await.unwrap_err(),
        StoreError::NotFound {
            term: "bulbasaur".to_string()
        }
    );
}
