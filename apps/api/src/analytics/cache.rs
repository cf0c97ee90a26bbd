//! Read-through JSON cache for analytics results.
//!
//! Redis outages never fail a request: errors are logged and the value is
//! computed from the database instead.

use std::future::Future;

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;

pub const DASHBOARD_KEY: &str = "analytics:dashboard";
pub const SKILLS_KEY: &str = "analytics:skills";
pub const DEPARTMENTS_KEY: &str = "analytics:departments";

#[derive(Clone)]
pub struct AnalyticsCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl AnalyticsCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    /// Returns the cached value under `key`, or computes, stores and returns it.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Analytics cache hit: {key}");
                return Ok(value);
            }
            Ok(None) => debug!("Analytics cache miss: {key}"),
            Err(e) => warn!("Analytics cache read failed for {key}: {e}"),
        }

        let value = compute().await?;
        if let Err(e) = self.set(key, &value).await {
            warn!("Analytics cache write failed for {key}: {e}");
        }
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = con.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        let mut con = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut con)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1, so every Redis call fails and the cache must
    // fall through to the computed value.
    fn unreachable_cache() -> AnalyticsCache {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        AnalyticsCache::new(client, 60)
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_compute() {
        let cache = unreachable_cache();
        let value: Vec<u32> = cache
            .get_or_compute(DASHBOARD_KEY, || async { Ok(vec![1, 2, 3]) })
            .await
            .unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_compute_errors_propagate() {
        let cache = unreachable_cache();
        let result: Result<u32, AppError> = cache
            .get_or_compute(SKILLS_KEY, || async {
                Err(AppError::NotFound("Job not found".to_string()))
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
