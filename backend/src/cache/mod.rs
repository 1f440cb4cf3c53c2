//! Per-user response cache
//!
//! Responses are stored as JSON under
//! `healthymeal:{namespace}:{user}:{params}` where `params` is the canonical
//! JSON of the normalised query. Each entry is tagged with its
//! namespace/user pair and with its user so writes can drop exactly the
//! affected entries. Cache failures are logged and behave like misses.
//!
//! Reads that fill the cache take a [`Generation`] before querying and store
//! through [`ResponseCache::put_if_current`], so a page read before a
//! concurrent write's invalidation is never kept. Generations are counted
//! per process.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Cache namespaces
pub mod ns {
    pub const RECIPES: &str = "recipes";
    pub const INGREDIENTS: &str = "ingredients";
    pub const PREFERENCES: &str = "preferences";
    pub const DASHBOARD: &str = "dashboard";
}

const KEY_PREFIX: &str = "healthymeal";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key/value backend of the response cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` for `ttl` and register `key` under every tag
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError>;

    /// Drop every entry registered under `tag`
    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError>;

    /// Evict expired entries; stores with native expiry return 0
    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}

/// Invalidation counters of a namespace/user pair, seen before a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    namespace: u64,
    user: u64,
}

/// Cache of serialised API responses
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cache backed by process memory
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// Canonical key for a set of normalised parameters
    pub fn key_for<P: Serialize>(params: &P) -> String {
        serde_json::to_string(params).unwrap_or_default()
    }

    fn entry_key(namespace: &str, user: Uuid, key: &str) -> String {
        format!("{}:{}:{}:{}", KEY_PREFIX, namespace, user, key)
    }

    fn namespace_tag(namespace: &str, user: Uuid) -> String {
        format!("{}:tag:{}:{}", KEY_PREFIX, namespace, user)
    }

    fn user_tag(user: Uuid) -> String {
        format!("{}:tag:user:{}", KEY_PREFIX, user)
    }

    fn counter(&self, tag: &str) -> u64 {
        let generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        generations.get(tag).copied().unwrap_or(0)
    }

    fn bump(&self, tag: String) {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        *generations.entry(tag).or_insert(0) += 1;
    }

    /// Current generation of `namespace` for `user`; take it before reading
    pub fn generation(&self, namespace: &str, user: Uuid) -> Generation {
        Generation {
            namespace: self.counter(&Self::namespace_tag(namespace, user)),
            user: self.counter(&Self::user_tag(user)),
        }
    }

    /// Cached value, if present and decodable
    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, user: Uuid, key: &str) -> Option<T> {
        let entry_key = Self::entry_key(namespace, user, key);
        let hit = match self.store.get(&entry_key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(namespace, error = %e, "Cache read failed");
                None
            }
        };

        let decoded = hit.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(namespace, error = %e, "Discarding undecodable cache entry");
                None
            }
        });

        if decoded.is_some() {
            metrics::counter!("healthymeal_cache_hits_total", "namespace" => namespace.to_string())
                .increment(1);
            debug!(namespace, %user, "Cache hit");
        } else {
            metrics::counter!("healthymeal_cache_misses_total", "namespace" => namespace.to_string())
                .increment(1);
        }
        decoded
    }

    /// Store a value for the configured TTL
    pub async fn put<T: Serialize>(&self, namespace: &str, user: Uuid, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(namespace, error = %e, "Cache serialization failed");
                return;
            }
        };
        let tags = [Self::namespace_tag(namespace, user), Self::user_tag(user)];
        if let Err(e) = self
            .store
            .set(&Self::entry_key(namespace, user, key), raw, self.ttl, &tags)
            .await
        {
            warn!(namespace, error = %e, "Cache write failed");
        }
    }

    /// Store a value read under `seen`, unless an invalidation has run since
    pub async fn put_if_current<T: Serialize>(
        &self,
        namespace: &str,
        user: Uuid,
        key: &str,
        value: &T,
        seen: Generation,
    ) {
        if self.generation(namespace, user) != seen {
            debug!(namespace, %user, "Skipping cache write after invalidation");
            return;
        }
        self.put(namespace, user, key, value).await;

        // an invalidation that ran during the write may have missed it
        if self.generation(namespace, user) != seen {
            self.drop_tag(namespace, Self::namespace_tag(namespace, user)).await;
        }
    }

    async fn drop_tag(&self, namespace: &str, tag: String) {
        if let Err(e) = self.store.invalidate_tag(&tag).await {
            warn!(namespace, error = %e, "Cache invalidation failed");
        }
    }

    /// Drop one namespace of a user's entries
    pub async fn invalidate(&self, namespace: &str, user: Uuid) {
        self.bump(Self::namespace_tag(namespace, user));
        if let Err(e) = self
            .store
            .invalidate_tag(&Self::namespace_tag(namespace, user))
            .await
        {
            warn!(namespace, error = %e, "Cache invalidation failed");
        }
    }

    /// Drop all of a user's entries
    pub async fn invalidate_user(&self, user: Uuid) {
        self.bump(Self::user_tag(user));
        if let Err(e) = self.store.invalidate_tag(&Self::user_tag(user)).await {
            warn!(%user, error = %e, "Cache invalidation failed");
        }
    }

    pub async fn purge_expired(&self) -> usize {
        match self.store.purge_expired().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Cache purge failed");
                0
            }
        }
    }
}

/// Periodically evict expired entries
pub fn spawn_cleanup(cache: ResponseCache, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Purged expired cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Page {
        items: Vec<String>,
    }

    #[derive(Serialize)]
    struct Params {
        page: u32,
        limit: u32,
    }

    fn cache() -> ResponseCache {
        ResponseCache::in_memory(Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = cache();
        let user = Uuid::new_v4();
        let key = ResponseCache::key_for(&Params { page: 1, limit: 10 });
        let page = Page {
            items: vec!["soup".to_string()],
        };

        cache.put(ns::RECIPES, user, &key, &page).await;
        assert_eq!(cache.get::<Page>(ns::RECIPES, user, &key).await, Some(page));
    }

    #[tokio::test]
    async fn test_entries_are_per_user() {
        let cache = cache();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        cache.put(ns::RECIPES, alice, "k", &1u32).await;
        assert_eq!(cache.get::<u32>(ns::RECIPES, bob, "k").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_namespace_only() {
        let cache = cache();
        let user = Uuid::new_v4();

        cache.put(ns::RECIPES, user, "a", &1u32).await;
        cache.put(ns::RECIPES, user, "b", &2u32).await;
        cache.put(ns::INGREDIENTS, user, "a", &3u32).await;

        cache.invalidate(ns::RECIPES, user).await;

        assert_eq!(cache.get::<u32>(ns::RECIPES, user, "a").await, None);
        assert_eq!(cache.get::<u32>(ns::RECIPES, user, "b").await, None);
        assert_eq!(cache.get::<u32>(ns::INGREDIENTS, user, "a").await, Some(3));
    }

    #[tokio::test]
    async fn test_invalidate_user_spares_others() {
        let cache = cache();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        cache.put(ns::RECIPES, alice, "k", &1u32).await;
        cache.put(ns::PREFERENCES, alice, "k", &2u32).await;
        cache.put(ns::RECIPES, bob, "k", &3u32).await;

        cache.invalidate_user(alice).await;

        assert_eq!(cache.get::<u32>(ns::RECIPES, alice, "k").await, None);
        assert_eq!(cache.get::<u32>(ns::PREFERENCES, alice, "k").await, None);
        assert_eq!(cache.get::<u32>(ns::RECIPES, bob, "k").await, Some(3));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = cache();
        let user = Uuid::new_v4();
        cache.put(ns::DASHBOARD, user, "k", &"text").await;
        assert_eq!(cache.get::<u32>(ns::DASHBOARD, user, "k").await, None);
    }

    #[tokio::test]
    async fn test_read_overtaken_by_invalidation_is_not_stored() {
        let cache = cache();
        let user = Uuid::new_v4();

        let seen = cache.generation(ns::RECIPES, user);
        // a write lands while the list query is in flight
        cache.invalidate(ns::RECIPES, user).await;
        cache.put_if_current(ns::RECIPES, user, "k", &1u32, seen).await;

        assert_eq!(cache.get::<u32>(ns::RECIPES, user, "k").await, None);
    }

    #[tokio::test]
    async fn test_logout_generation_blocks_stale_put() {
        let cache = cache();
        let user = Uuid::new_v4();

        let seen = cache.generation(ns::DASHBOARD, user);
        cache.invalidate_user(user).await;
        cache.put_if_current(ns::DASHBOARD, user, "stats", &3u32, seen).await;

        assert_eq!(cache.get::<u32>(ns::DASHBOARD, user, "stats").await, None);
    }

    #[tokio::test]
    async fn test_put_if_current_stores_when_untouched() {
        let cache = cache();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let seen = cache.generation(ns::INGREDIENTS, alice);
        // other users and namespaces do not affect the generation
        cache.invalidate(ns::INGREDIENTS, bob).await;
        cache.invalidate(ns::RECIPES, alice).await;
        cache.put_if_current(ns::INGREDIENTS, alice, "k", &7u32, seen).await;

        assert_eq!(cache.get::<u32>(ns::INGREDIENTS, alice, "k").await, Some(7));
    }

    #[test]
    fn test_key_for_is_canonical_json() {
        assert_eq!(
            ResponseCache::key_for(&Params { page: 2, limit: 20 }),
            r#"{"page":2,"limit":20}"#
        );
    }
}
