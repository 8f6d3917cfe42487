//! Request-scoped query cache and its transportable snapshot
//!
//! The cache is keyed by [`ResourcePath`]. On the server it is filled by one
//! batched fetch and dehydrated into the payload; in the browser it is
//! rebuilt from that snapshot and extended by later navigations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    account::AccessToken,
    context::RequestContext,
    descriptor::{ResourceDescriptor, ResourcePath},
    error::FetchError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCache {
    entries: BTreeMap<ResourcePath, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: ResourcePath, data: Value) {
        self.insert_at(path, data, Utc::now());
    }

    pub fn insert_at(&mut self, path: ResourcePath, data: Value, fetched_at: DateTime<Utc>) {
        self.entries.insert(path, CacheEntry { data, fetched_at });
    }

    pub fn get(&self, path: &ResourcePath) -> Option<&Value> {
        self.entries.get(path).map(|entry| &entry.data)
    }

    pub fn entry(&self, path: &ResourcePath) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Decode a cached value. A value that does not decode as `T` reads as
    /// absent.
    pub fn get_as<T: DeserializeOwned>(&self, path: &ResourcePath) -> Option<T> {
        let value = self.get(path)?.clone();
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                tracing::debug!(%path, error = %err, "cached value has unexpected shape");
                None
            }
        }
    }

    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ResourcePath> {
        self.entries.keys()
    }

    /// Take every entry of `other`, replacing entries with the same path.
    pub fn merge(&mut self, other: QueryCache) {
        self.entries.extend(other.entries);
    }

    /// Descriptors whose path is not cached, or was fetched longer than
    /// `stale_after` before `now`. Duplicate paths are reported once.
    pub fn missing(
        &self,
        descriptors: &[ResourceDescriptor],
        stale_after: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Vec<ResourceDescriptor> {
        let mut seen = Vec::new();
        let mut missing = Vec::new();
        for descriptor in descriptors {
            let path = descriptor.path();
            if seen.contains(&path) {
                continue;
            }
            seen.push(path);

            let fresh = self.entries.get(path).is_some_and(|entry| {
                stale_after.is_none_or(|max_age| now - entry.fetched_at <= max_age)
            });
            if !fresh {
                missing.push(descriptor.clone());
            }
        }
        missing
    }

    pub fn dehydrate(&self) -> CacheSnapshot {
        CacheSnapshot {
            queries: self
                .entries
                .iter()
                .map(|(key, entry)| DehydratedQuery {
                    key: key.clone(),
                    data: entry.data.clone(),
                    fetched_at: entry.fetched_at,
                })
                .collect(),
        }
    }

    pub fn hydrate(snapshot: CacheSnapshot) -> Self {
        let mut cache = Self::new();
        for query in snapshot.queries {
            cache.insert_at(query.key, query.data, query.fetched_at);
        }
        cache
    }
}

/// Serializable form of a [`QueryCache`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub queries: Vec<DehydratedQuery>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub key: ResourcePath,
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
}

/// Executes a batch of descriptors as one unit.
///
/// Implementations may fetch descriptors concurrently, but the call either
/// yields a cache holding every descriptor's parsed body or fails as a whole.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn fetch_batch(
        &self,
        cx: &RequestContext,
        descriptors: &[ResourceDescriptor],
        token: Option<&AccessToken>,
    ) -> Result<QueryCache, FetchError>;
}
