//! Embedding cache
//!
//! Normalizes query text, serves repeat lookups from a bounded LRU map and
//! retries provider failures with exponential backoff. The cache is an
//! explicitly constructed object shared by every concurrent caller; concurrent
//! misses on the same key wait on a single provider call.

use crate::provider::EmbeddingProvider;
use backon::{BackoffBuilder, BlockingRetryable, ExponentialBuilder};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use shelfscout_core::{Deadline, Error, Result, Vector};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Exponential backoff for provider calls.
///
/// The n-th wait is `base_delay × 2^(n-1)` clamped to `[min_delay, max_delay]`;
/// `max_attempts` counts the first call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            base_delay: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_attempts,
        }
    }

    fn clamp_delay(&self, delay: Duration) -> Duration {
        delay.max(self.min_delay).min(self.max_delay)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    /// Waits between consecutive attempts, in order
    pub fn schedule(&self) -> Vec<Duration> {
        self.backoff()
            .build()
            .map(|delay| self.clamp_delay(delay))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: u64,
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Trim, lowercase and collapse internal whitespace runs to one space
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub struct EmbeddingCache {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Cache<String, Arc<[f32]>>,
    retry: RetryPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            provider,
            entries,
            retry: config.retry,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn embed(&self, text: &str) -> Result<Vector> {
        self.embed_with_deadline(text, &Deadline::none())
    }

    /// Embed `text`, consulting the cache under its normalized form
    pub fn embed_with_deadline(&self, text: &str, deadline: &Deadline) -> Result<Vector> {
        let key = normalize_text(text);
        if key.is_empty() {
            return Err(Error::Validation("cannot embed empty text".into()));
        }

        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "embedding cache hit");
            return Ok(Vector::from_slice(&hit));
        }

        // Waiters share the leader's outcome. A leader that ran out of its own
        // time budget does not fail waiters whose budget is still open.
        loop {
            deadline.check()?;
            let led = Cell::new(false);
            let outcome = self.entries.try_get_with(key.clone(), || {
                led.set(true);
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.fetch(&key, deadline).map(Arc::from)
            });

            match outcome {
                Ok(value) => return Ok(Vector::from_slice(&value)),
                Err(e) if !led.get() && e.is_deadline() && !deadline.is_expired() => {
                    debug!(key = %key, "in-flight embedding hit another caller's deadline, retrying");
                }
                Err(e) => return Err(Error::from_shared(e)),
            }
        }
    }

    fn fetch(&self, key: &str, deadline: &Deadline) -> Result<Vec<f32>> {
        let attempts = Cell::new(0usize);
        let deadline = *deadline;
        let (min_delay, max_delay) = (self.retry.min_delay, self.retry.max_delay);

        let outcome = (|| {
            deadline.check()?;
            attempts.set(attempts.get() + 1);
            self.provider.embed_text(key)
        })
        .retry(self.retry.backoff())
        .sleep(move |delay: Duration| {
            let delay = delay.max(min_delay).min(max_delay);
            std::thread::sleep(deadline.remaining().map_or(delay, |left| delay.min(left)))
        })
        .when(|e: &Error| e.is_retryable() && !deadline.is_expired())
        .notify(|e: &Error, delay: Duration| {
            warn!(
                model = self.provider.model(),
                attempt = attempts.get(),
                delay = ?self.retry.clamp_delay(delay),
                error = %e,
                "embedding provider call failed, retrying"
            );
        })
        .call();

        match outcome {
            Ok(values) if values.is_empty() => {
                warn!(model = self.provider.model(), "embedding provider returned no values");
                Err(Error::EmptyEmbedding)
            }
            Ok(values) if values.len() != self.provider.dimension() => Err(Error::InvalidDimension {
                field: "text_embedding",
                expected: self.provider.dimension(),
                actual: values.len(),
            }),
            Ok(values) => {
                debug!(model = self.provider.model(), attempts = attempts.get(), "embedded query");
                Ok(values)
            }
            Err(e) if e.is_retryable() && deadline.is_expired() => Err(Error::DeadlineExceeded),
            Err(e) if e.is_retryable() => {
                warn!(
                    model = self.provider.model(),
                    attempts = attempts.get(),
                    error = %e,
                    "embedding provider exhausted retries"
                );
                Err(Error::EmbeddingExhausted {
                    attempts: attempts.get(),
                    source: Box::new(e),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Approximate entry count; call [`Self::run_pending_tasks`] for an exact figure
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}
