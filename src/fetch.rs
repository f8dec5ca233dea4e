use anyhow::anyhow;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{debug, warn};

use crate::cache::DiskCache;
use crate::ergast::{RemoteSource, Request, Table};

/// Retry and pacing settings for upstream requests
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Minimum gap between two network calls (upstream rate limit)
    pub request_interval: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            request_interval: Duration::from_millis(300),
        }
    }
}

/// A request that could not be served from cache and failed every attempt.
#[derive(Debug, Clone, thiserror::Error)]
#[error("fetch {key} failed after {attempts} attempt(s): {reason}")]
pub struct FetchError {
    pub key: String,
    pub attempts: u32,
    pub reason: String,
}

/// Fetch counters (thread-safe).
#[derive(Debug, Default)]
pub struct FetchStats {
    cache_hits: AtomicU64,
    network_calls: AtomicU64,
    cache_writes: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub network_calls: u64,
    pub cache_writes: u64,
    pub failures: u64,
}

impl FetchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_calls: self.network_calls.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Cache-first fetcher with bounded retries.
///
/// Every upstream table (schedule, results, driver and constructor names) goes
/// through [`Fetcher::fetch`]; the request decides the cache key and URL, the
/// table type decides how the body is normalized.
pub struct Fetcher<S> {
    source: S,
    cache: DiskCache,
    config: FetchConfig,
    stats: FetchStats,
    last_call: Mutex<Option<Instant>>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: RemoteSource> Fetcher<S> {
    pub fn new(source: S, cache: DiskCache, config: FetchConfig) -> Self {
        Self {
            source,
            cache,
            config,
            stats: FetchStats::default(),
            last_call: Mutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Return the normalized table for `request`, from cache when possible.
    pub async fn fetch<T: Table>(&self, request: &Request) -> Result<T, FetchError> {
        let key = request.cache_key();

        if let Some(table) = self.cached::<T>(&key) {
            return Ok(table);
        }

        // Only one fetch per key at a time; a waiter finds the winner's entry
        let key_lock = self.key_lock(&key);
        let result = {
            let _guard = key_lock.lock().await;
            self.fetch_locked::<T>(request, &key).await
        };
        self.release_key(&key, key_lock);
        result
    }

    async fn fetch_locked<T: Table>(&self, request: &Request, key: &str) -> Result<T, FetchError> {
        if let Some(table) = self.cached::<T>(key) {
            return Ok(table);
        }

        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;
        let strategy = FixedInterval::new(self.config.retry_delay)
            .take(self.config.max_attempts.saturating_sub(1) as usize);

        let result = Retry::spawn(strategy, move || self.attempt::<T>(request, attempts_ref)).await;
        let attempts = attempts.load(Ordering::Relaxed);

        match result {
            Ok(table) => {
                self.store(key, &table);
                Ok(table)
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                Err(FetchError {
                    key: key.to_string(),
                    attempts,
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    fn cached<T: Table>(&self, key: &str) -> Option<T> {
        let entry = self.cache.get(key)?;
        match serde_json::from_value(entry.payload) {
            Ok(table) => {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                Some(table)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached payload no longer decodes, refetching");
                None
            }
        }
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        in_flight.entry(key.to_string()).or_default().clone()
    }

    /// Drop the key's lock entry once no other fetch is holding or waiting on it
    fn release_key(&self, key: &str, key_lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        drop(key_lock);
        if in_flight.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            in_flight.remove(key);
        }
    }

    async fn attempt<T: Table>(&self, request: &Request, attempts: &AtomicU32) -> anyhow::Result<T> {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        self.pace().await;
        self.stats.network_calls.fetch_add(1, Ordering::Relaxed);
        debug!(request = %request, attempt, "Fetching from upstream");

        let outcome = match self.source.get(request).await {
            Ok(body) => match T::normalize(request, &body) {
                Ok(table) if table.is_empty() => Err(anyhow!("empty response")),
                Ok(table) => Ok(table),
                Err(e) => Err(e.context("malformed response")),
            },
            Err(e) => Err(e),
        };

        if let Err(ref e) = outcome {
            if attempt < self.config.max_attempts {
                let error = format!("{:#}", e);
                warn!(request = %request, attempt, %error, "Attempt failed, retrying");
            }
        }
        outcome
    }

    /// Sleep until `request_interval` has passed since the previous call
    async fn pace(&self) {
        let wait = {
            let mut last_call = self.last_call.lock().unwrap_or_else(|p| p.into_inner());
            let now = Instant::now();
            let next = last_call
                .map(|last| last + self.config.request_interval)
                .filter(|next| *next > now);
            *last_call = Some(next.unwrap_or(now));
            next.map(|next| next - now)
        };

        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
    }

    fn store<T: Table>(&self, key: &str, table: &T) {
        let payload = match serde_json::to_value(table) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize table for cache");
                return;
            }
        };

        // The table is still returned when the disk write fails; the next run refetches
        match self.cache.put(key, payload) {
            Ok(_) => {
                self.stats.cache_writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(key, %error, "Failed to write cache entry");
            }
        }
    }
}
