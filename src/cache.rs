//! Search-cache key derivation and store-or-fetch logic.
//!
//! Cache keys are content hashes over a canonical (key-sorted) JSON
//! serialization of the mapped query, so semantically identical queries hash
//! identically regardless of field insertion order. The persistence engine
//! stays behind the [`CacheStore`] trait; only the store primitives the cache
//! needs are required of it.

use chrono::Local;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::mapper::MappedQuery;

/// Default cache collection name
pub const SEARCH_CACHE_COLLECTION: &str = "search_cache";

/// Timestamp format recorded in cache entries
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Persistence failure surfaced by a [`CacheStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Store primitives the cache layer requires from a document store
pub trait CacheStore: Send + Sync {
    /// Look up a cached document by its `list_id`
    fn find_one(&self, collection: &str, list_id: &str) -> Result<Option<Value>, StoreError>;

    /// Insert a document; the document carries its own `list_id`
    fn insert_one(&self, collection: &str, document: Value) -> Result<(), StoreError>;

    /// Delete every document with the given `list_id`, returning the count
    fn delete_many(&self, collection: &str, list_id: &str) -> Result<usize, StoreError>;
}

/// Bounded in-memory store, one LRU per collection.
///
/// Used by the CLI and tests; a real deployment points [`SearchCache`] at a
/// document database instead.
pub struct MemoryStore {
    collections: Mutex<HashMap<String, LruCache<String, Value>>>,
    capacity: NonZeroUsize,
}

impl MemoryStore {
    /// Create a store holding at most `capacity` entries per collection
    pub fn new(capacity: usize) -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            capacity: NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl CacheStore for MemoryStore {
    fn find_one(&self, collection: &str, list_id: &str) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.lock();
        Ok(collections
            .get_mut(collection)
            .and_then(|entries| entries.get(list_id).cloned()))
    }

    fn insert_one(&self, collection: &str, document: Value) -> Result<(), StoreError> {
        let list_id = document["list_id"]
            .as_str()
            .ok_or_else(|| StoreError::Backend("document is missing a list_id".to_string()))?
            .to_string();
        let mut collections = self.collections.lock();
        collections
            .entry(collection.to_string())
            .or_insert_with(|| LruCache::new(self.capacity))
            .put(list_id, document);
        Ok(())
    }

    fn delete_many(&self, collection: &str, list_id: &str) -> Result<usize, StoreError> {
        let mut collections = self.collections.lock();
        let removed = collections
            .get_mut(collection)
            .and_then(|entries| entries.pop(list_id));
        Ok(usize::from(removed.is_some()))
    }
}

/// Cache behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Collection the cache entries live in
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Whether the AI-parsing metadata participates in the cache key
    #[serde(default = "default_include_ai_metadata")]
    pub include_ai_metadata: bool,
}

fn default_collection() -> String {
    SEARCH_CACHE_COLLECTION.to_string()
}

const fn default_include_ai_metadata() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            include_ai_metadata: default_include_ai_metadata(),
        }
    }
}

/// AI-parsing context recorded alongside (and optionally hashed into) a
/// cache entry
#[derive(Debug, Clone, Serialize)]
pub struct AiParsingMetadata {
    pub original_query: String,
    pub parsed_parameters: Value,
    pub mapped_parameters: Value,
}

/// Result of [`SearchCache::store_or_fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub list_id: String,
    /// `false` when an entry for this key already existed
    pub created: bool,
}

/// Derives deterministic cache keys and records search queries.
pub struct SearchCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl SearchCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Content hash identifying a mapped query (and, when configured, its
    /// AI-parsing metadata)
    pub fn query_hash(
        &self,
        mapped: &MappedQuery,
        metadata: Option<&AiParsingMetadata>,
    ) -> Result<String, StoreError> {
        let mut document = to_object(mapped)?;
        if self.config.include_ai_metadata
            && let Some(metadata) = metadata
        {
            let metadata_fields = to_object(metadata)?;
            document.extend(metadata_fields);
        }
        Ok(hash_value(&Value::Object(document)))
    }

    /// Record the query under its content hash, or return the existing entry's
    /// key. A fresh insert is preceded by a delete so at most one live entry
    /// per hash exists.
    pub fn store_or_fetch(
        &self,
        mapped: &MappedQuery,
        request: &Value,
        search_type: &str,
        metadata: Option<&AiParsingMetadata>,
    ) -> Result<CacheOutcome, StoreError> {
        let list_id = self.query_hash(mapped, metadata)?;

        if self
            .store
            .find_one(&self.config.collection, &list_id)?
            .is_some()
        {
            return Ok(CacheOutcome {
                list_id,
                created: false,
            });
        }

        let query_value =
            serde_json::to_value(mapped).map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut cache_info = json!({
            "api_request": request,
            "query": query_value,
            "search_type": search_type,
            "timestamp": create_timestamp(),
        });
        if let Some(metadata) = metadata {
            cache_info["ai_parsing"] =
                serde_json::to_value(metadata).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let document = json!({
            "list_id": list_id.clone(),
            "cache_info": cache_info,
        });

        self.store.delete_many(&self.config.collection, &list_id)?;
        self.store.insert_one(&self.config.collection, document)?;

        Ok(CacheOutcome {
            list_id,
            created: true,
        })
    }

    /// Fetch a cached entry by its key
    pub fn fetch(&self, list_id: &str) -> Result<Option<Value>, StoreError> {
        self.store.find_one(&self.config.collection, list_id)
    }
}

/// Standardized timestamp string for cache entries
pub fn create_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// SHA-256 hex digest of the canonical serialization of a JSON value
pub fn hash_value(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Serialize with object keys sorted at every level, so the digest is
/// independent of field insertion order.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(nested) = map.get(*key) {
                    write_canonical(nested, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Backend(
            "expected an object serialization".to_string(),
        )),
        Err(e) => Err(StoreError::Backend(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_insertion_order_independent() {
        let mut first = Map::new();
        first.insert("b".to_string(), json!(2));
        first.insert("a".to_string(), json!({"y": 1, "x": [1, 2]}));

        let mut second = Map::new();
        second.insert("a".to_string(), json!({"x": [1, 2], "y": 1}));
        second.insert("b".to_string(), json!(2));

        assert_eq!(
            hash_value(&Value::Object(first)),
            hash_value(&Value::Object(second))
        );
    }

    #[test]
    fn test_hash_distinguishes_content() {
        assert_ne!(hash_value(&json!({"a": 1})), hash_value(&json!({"a": 2})));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::default();
        let document = json!({"list_id": "abc", "cache_info": {}});
        store.insert_one("c", document.clone()).expect("insert");
        assert_eq!(
            store.find_one("c", "abc").expect("find"),
            Some(document)
        );
        assert_eq!(store.delete_many("c", "abc").expect("delete"), 1);
        assert_eq!(store.find_one("c", "abc").expect("find"), None);
    }
}
