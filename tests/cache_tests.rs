use serde_json::{Map, Value, json};
use std::sync::Arc;

use glysearch::cache::{
    AiParsingMetadata, CacheConfig, CacheStore, MemoryStore, SearchCache, StoreError, hash_value,
};
use glysearch::mapper::{MappedQuery, map_parameters};
use glysearch::schema::{GlycanSearchParams, ValidatedParameters};

/// Store double whose every operation fails
struct FailingStore;

impl CacheStore for FailingStore {
    fn find_one(&self, _collection: &str, _list_id: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    fn insert_one(&self, _collection: &str, _document: Value) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    fn delete_many(&self, _collection: &str, _list_id: &str) -> Result<usize, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

fn sample_query() -> MappedQuery {
    let params = GlycanSearchParams {
        glycan_type: Some("N-linked".to_string()),
        organism_name: Some(vec!["Human".to_string()]),
        operation: "AND".to_string(),
        ..GlycanSearchParams::default()
    };
    map_parameters(&ValidatedParameters::Glycan(params))
}

fn sample_metadata() -> AiParsingMetadata {
    AiParsingMetadata {
        original_query: "show me n-linked glycans in humans".to_string(),
        parsed_parameters: json!({"glycan_type": "N-linked"}),
        mapped_parameters: json!({"glycan_type": "N-linked", "query_type": "search_glycan"}),
    }
}

#[test]
fn test_hash_is_insertion_order_independent() {
    let mut first = Map::new();
    first.insert("mass".to_string(), json!({"min": 150, "max": 160}));
    first.insert("operation".to_string(), json!("AND"));
    first.insert("query_type".to_string(), json!("search_glycan"));

    let mut second = Map::new();
    second.insert("query_type".to_string(), json!("search_glycan"));
    second.insert("operation".to_string(), json!("AND"));
    second.insert("mass".to_string(), json!({"max": 160, "min": 150}));

    assert_eq!(
        hash_value(&Value::Object(first)),
        hash_value(&Value::Object(second))
    );
}

#[test]
fn test_store_or_fetch_creates_then_fetches() {
    let cache = SearchCache::new(Arc::new(MemoryStore::default()), CacheConfig::default());
    let query = sample_query();
    let request = json!({"query": "show me n-linked glycans in humans"});
    let metadata = sample_metadata();

    let first = cache
        .store_or_fetch(&query, &request, "full", Some(&metadata))
        .expect("store");
    assert!(first.created);

    let second = cache
        .store_or_fetch(&query, &request, "full", Some(&metadata))
        .expect("fetch");
    assert!(!second.created);
    assert_eq!(first.list_id, second.list_id);
}

#[test]
fn test_cache_entry_document_shape() {
    let store = Arc::new(MemoryStore::default());
    let cache = SearchCache::new(Arc::clone(&store) as Arc<dyn CacheStore>, CacheConfig::default());
    let query = sample_query();
    let request = json!({"query": "show me n-linked glycans in humans"});
    let metadata = sample_metadata();

    let outcome = cache
        .store_or_fetch(&query, &request, "full", Some(&metadata))
        .expect("store");

    let document = cache
        .fetch(&outcome.list_id)
        .expect("lookup")
        .expect("entry exists");
    assert_eq!(document["list_id"], Value::String(outcome.list_id));
    let cache_info = &document["cache_info"];
    assert_eq!(cache_info["api_request"], request);
    assert_eq!(cache_info["search_type"], "full");
    assert_eq!(cache_info["query"]["query_type"], "search_glycan");
    assert!(cache_info["timestamp"].is_string());
    assert_eq!(
        cache_info["ai_parsing"]["original_query"],
        "show me n-linked glycans in humans"
    );
}

#[test]
fn test_metadata_flag_changes_the_key() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
    let with_metadata = SearchCache::new(Arc::clone(&store), CacheConfig::default());
    let without_metadata = SearchCache::new(
        Arc::clone(&store),
        CacheConfig {
            include_ai_metadata: false,
            ..CacheConfig::default()
        },
    );

    let query = sample_query();
    let metadata = sample_metadata();

    let keyed = with_metadata
        .query_hash(&query, Some(&metadata))
        .expect("hash");
    let unkeyed = without_metadata
        .query_hash(&query, Some(&metadata))
        .expect("hash");
    assert_ne!(keyed, unkeyed);

    // With the flag off the metadata is inert: the hash matches a plain query hash
    let bare = without_metadata.query_hash(&query, None).expect("hash");
    assert_eq!(unkeyed, bare);
}

#[test]
fn test_different_metadata_changes_the_key_when_included() {
    let cache = SearchCache::new(Arc::new(MemoryStore::default()), CacheConfig::default());
    let query = sample_query();
    let metadata = sample_metadata();
    let other_metadata = AiParsingMetadata {
        original_query: "n-linked glycans for people".to_string(),
        ..sample_metadata()
    };

    let first = cache.query_hash(&query, Some(&metadata)).expect("hash");
    let second = cache
        .query_hash(&query, Some(&other_metadata))
        .expect("hash");
    assert_ne!(first, second);
}

#[test]
fn test_storage_failures_surface_as_store_errors() {
    let cache = SearchCache::new(Arc::new(FailingStore), CacheConfig::default());
    let query = sample_query();
    let request = json!({"query": "anything"});

    let result = cache.store_or_fetch(&query, &request, "full", None);
    assert!(matches!(result, Err(StoreError::Backend(_))));
}
