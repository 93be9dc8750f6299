//! In-memory cache of scraped (pre-sentiment) articles.
//!
//! Entries are keyed by [`CacheKey`]: ticker, source, requested count and a
//! ten-minute bucket index (`unix_seconds / 600`). When the bucket rolls over
//! the key simply misses and the source is scraped again. The request's TTL
//! can end an entry earlier: an entry lives until its bucket ends or its TTL
//! runs out, whichever comes first. Expired entries are never served and are
//! dropped by [`ArticleCache::sweep`].
//!
//! The cache lives as long as its [`Pipeline`](crate::pipeline::Pipeline).
//! The CLI builds one pipeline and runs it once, so a single invocation never
//! hits; reuse only happens when one pipeline serves repeated runs.
//!
//! Sentiment is never cached; it depends on the analysis mode of each run.

use crate::models::{ArticleRecord, Source};
use crate::scrapers::ScrapeOutcome;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Width of the time window that quantizes cache keys.
pub const BUCKET_WIDTH: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub source: Source,
    pub bucket: u64,
    pub count: usize,
}

impl CacheKey {
    pub fn new(ticker: &str, source: Source, count: usize, now: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.to_string(),
            source,
            bucket: bucket_index(now, BUCKET_WIDTH),
            count,
        }
    }

    /// When an entry stored at `now` stops being served: the end of the
    /// key's bucket or `now + ttl`, whichever is earlier.
    pub fn expires_at(&self, now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        let by_ttl = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        by_ttl.min(bucket_end(self.bucket, BUCKET_WIDTH))
    }
}

/// Index of the fixed-width window `now` falls in.
pub fn bucket_index(now: DateTime<Utc>, bucket_width: Duration) -> u64 {
    let width = bucket_width.as_secs().max(1);
    (now.timestamp().max(0) as u64) / width
}

/// First instant after the bucket `bucket` of width `bucket_width`.
pub fn bucket_end(bucket: u64, bucket_width: Duration) -> DateTime<Utc> {
    let width = bucket_width.as_secs().max(1);
    let secs = (bucket + 1).saturating_mul(width).min(i64::MAX as u64) as i64;
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug)]
struct CacheEntry {
    articles: Vec<ArticleRecord>,
    expires_at: DateTime<Utc>,
}

/// Result of a read-through lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub outcome: ScrapeOutcome,
    pub hit: bool,
}

/// Process-wide article cache. Safe to share between concurrent scrapes.
#[derive(Debug, Default)]
pub struct ArticleCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ArticleCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Articles stored under `key`, unless the entry has expired by `now`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Vec<ArticleRecord>> {
        let found = self
            .lock()
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.articles.clone());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: CacheKey, articles: Vec<ArticleRecord>, expires_at: DateTime<Utc>) {
        self.lock().insert(
            key,
            CacheEntry {
                articles,
                expires_at,
            },
        );
    }

    /// Return the cached articles for `key`, or run `fetch` and cache its
    /// result. Outcomes of a failed page fetch are returned but not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        now: DateTime<Utc>,
        ttl: Duration,
        fetch: F,
    ) -> CacheLookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ScrapeOutcome>,
    {
        if let Some(articles) = self.get(&key, now) {
            debug!(ticker = %key.ticker, source = %key.source, bucket = key.bucket, "Cache hit");
            return CacheLookup {
                outcome: ScrapeOutcome {
                    articles,
                    ..ScrapeOutcome::default()
                },
                hit: true,
            };
        }

        let outcome = fetch().await;
        if !outcome.fetch_failed {
            let expires_at = key.expires_at(now, ttl);
            self.insert(key, outcome.articles.clone(), expires_at);
        }
        CacheLookup {
            outcome,
            hit: false,
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Swept expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
