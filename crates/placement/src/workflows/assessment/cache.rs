use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

const REDIS_KEY_PREFIX: &str = "form-link:";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Durable memo from responder link to resolved form id. No expiry, no
/// eviction; concurrent writers are last-write-wins.
#[async_trait]
pub trait ResourceCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

#[derive(Debug, Default)]
pub struct InMemoryResourceCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryResourceCache {
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> CacheError {
        CacheError::Backend("cache lock poisoned".to_string())
    }
}

#[async_trait]
impl ResourceCache for InMemoryResourceCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.contains_key(key))
    }
}

/// Redis-backed cache sharing one multiplexed connection across callers.
#[derive(Clone)]
pub struct RedisResourceCache {
    connection: MultiplexedConnection,
}

impl RedisResourceCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|err| CacheError::Backend(format!("invalid redis url: {err}")))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| CacheError::Backend(format!("redis connect failed: {err}")))?;
        Ok(Self { connection })
    }

    fn key(key: &str) -> String {
        format!("{REDIS_KEY_PREFIX}{key}")
    }
}

impl std::fmt::Debug for RedisResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisResourceCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl ResourceCache for RedisResourceCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(Self::key(key))
            .await
            .map_err(|err| CacheError::Backend(format!("redis get failed: {err}")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(Self::key(key), value)
            .await
            .map_err(|err| CacheError::Backend(format!("redis set failed: {err}")))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection.clone();
        conn.exists::<_, bool>(Self::key(key))
            .await
            .map_err(|err| CacheError::Backend(format!("redis exists failed: {err}")))
    }
}
