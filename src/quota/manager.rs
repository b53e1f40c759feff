//! Quota construction and registry
//!
//! Quotas are built lazily, cached by data-source identity, and evicted
//! after idle time so abandoned or renamed sources do not leak. The
//! registry caps the number of tracked sources.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

type DirectGovernor = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Identity of a quota.
///
/// Equality and hashing consider only the data-source name: the quota
/// registry indexes by source identity alone, so the limiter built for
/// the first request with a given name silently applies to later
/// requests carrying different numeric limits, until idle eviction
/// recycles the entry. First writer wins, deliberately.
#[derive(Debug, Clone)]
pub struct QuotaKey {
    /// Logical data-source identity
    pub source: String,
    /// Token-bucket rate; 0 disables rate limiting
    pub requests_per_second: u32,
    /// Concurrent connection bound; 0 disables the bound
    pub max_connections: u32,
}

impl QuotaKey {
    /// Create a key for a data source
    pub fn new(source: impl Into<String>, requests_per_second: u32, max_connections: u32) -> Self {
        Self {
            source: source.into(),
            requests_per_second,
            max_connections,
        }
    }
}

impl PartialEq for QuotaKey {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for QuotaKey {}

impl Hash for QuotaKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

/// Combined rate and connection limits for one data source
pub struct SourceQuota {
    rate: Option<DirectGovernor>,
    connections: Option<Arc<Semaphore>>,
}

impl SourceQuota {
    /// Build a quota from a key's numeric limits
    pub fn new(key: &QuotaKey) -> Self {
        let rate = NonZeroU32::new(key.requests_per_second).map(|rps| {
            Governor::direct(Quota::per_second(rps).allow_burst(rps))
        });

        let connections = NonZeroU32::new(key.max_connections)
            .map(|max| Arc::new(Semaphore::new(max.get() as usize)));

        Self { rate, connections }
    }

    /// Whether any rate limit is active
    pub fn has_rate_limit(&self) -> bool {
        self.rate.is_some()
    }

    /// Whether any connection bound is active
    pub fn has_connection_limit(&self) -> bool {
        self.connections.is_some()
    }

    /// Run an action under this quota.
    ///
    /// The connection permit is acquired first, then the rate permit;
    /// both waits block (FIFO-fair for the semaphore). The connection
    /// permit is released on every exit path when the guard drops; rate
    /// permits are time-based and never released.
    pub async fn run<F, T>(&self, action: F) -> T
    where
        F: Future<Output = T>,
    {
        let _permit = match &self.connections {
            Some(semaphore) => {
                // Semaphore is never closed, so acquire cannot fail
                Some(
                    Arc::clone(semaphore)
                        .acquire_owned()
                        .await
                        .expect("quota semaphore closed"),
                )
            }
            None => None,
        };

        if let Some(rate) = &self.rate {
            rate.until_ready().await;
        }

        action.await
    }
}

impl std::fmt::Debug for SourceQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceQuota")
            .field("has_rate_limit", &self.has_rate_limit())
            .field("has_connection_limit", &self.has_connection_limit())
            .finish()
    }
}

/// Configuration for the quota registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of tracked sources
    pub max_sources: usize,
    /// Idle time after which a quota is evicted
    pub idle_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sources: 64,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

struct TrackedQuota {
    quota: Arc<SourceQuota>,
    last_used: Instant,
}

/// Shared registry of per-source quotas.
///
/// Construct-once-per-key under concurrent first access: all lookups
/// for one source name share the same quota instance.
pub struct QuotaRegistry {
    inner: Mutex<HashMap<String, TrackedQuota>>,
    config: RegistryConfig,
}

impl QuotaRegistry {
    /// Create a registry with default limits
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom limits
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Look up or lazily create the quota for a key.
    ///
    /// The key's numeric limits only matter on first construction; see
    /// [`QuotaKey`] for the identity-only equality rule.
    pub async fn quota_for(&self, key: &QuotaKey) -> Arc<SourceQuota> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        inner.retain(|source, tracked| {
            let keep = now.duration_since(tracked.last_used) < self.config.idle_timeout;
            if !keep {
                debug!("Evicting idle quota for source '{source}'");
            }
            keep
        });

        if let Some(tracked) = inner.get_mut(&key.source) {
            tracked.last_used = now;
            return Arc::clone(&tracked.quota);
        }

        // Cap the registry by dropping the least recently used entry
        if inner.len() >= self.config.max_sources {
            if let Some(oldest) = inner
                .iter()
                .min_by_key(|(_, tracked)| tracked.last_used)
                .map(|(source, _)| source.clone())
            {
                debug!("Quota registry full, evicting '{oldest}'");
                inner.remove(&oldest);
            }
        }

        let quota = Arc::new(SourceQuota::new(key));
        inner.insert(
            key.source.clone(),
            TrackedQuota {
                quota: Arc::clone(&quota),
                last_used: now,
            },
        );
        quota
    }

    /// Number of currently tracked sources
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no sources are tracked
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl Default for QuotaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QuotaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
