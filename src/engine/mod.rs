//! Fetch pipeline
//!
//! Wires the layers together for one query execution: request
//! descriptor construction, cache lookup, quota-gated HTTP execution,
//! response parsing, and chunk production. The [`FetchEngine`] owns the
//! shared infrastructure (executor, cache, quota registry); a
//! [`QueryFetcher`] binds it to one data source and query and drives a
//! [`ChunkStream`] over the configured pagination strategy.

mod types;

pub use types::{FetchStats, StatsSnapshot};

use crate::cache::{CacheConfig, ResponseCache};
use crate::config::{DataSourceConfig, EngineConfig, SourceQuery};
use crate::error::Result;
use crate::http::{HttpExecutor, RequestDescriptor};
use crate::pagination::{build_paginator, Chunk, ChunkStream, PageFetcher, PageRequest};
use crate::quota::{QuotaKey, QuotaRegistry, SourceQuota};
use crate::transform::{body_record_count, parse_body, BodyDumper};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared fetch infrastructure.
///
/// Constructed explicitly and passed where needed; there are no ambient
/// singletons. One engine serves any number of sources and queries,
/// sharing the cache and the per-source quota registry across them.
pub struct FetchEngine {
    executor: HttpExecutor,
    cache: ResponseCache,
    quotas: QuotaRegistry,
    dumper: BodyDumper,
}

impl FetchEngine {
    /// Create an engine from runtime settings
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            executor: HttpExecutor::new()?,
            cache: ResponseCache::new(CacheConfig::new(
                config.cache_capacity,
                &config.cache_dir,
            )),
            quotas: QuotaRegistry::new(),
            dumper: BodyDumper::new(&config.cache_dir, config.dump_bodies),
        })
    }

    /// The shared response cache
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The shared quota registry
    pub fn quotas(&self) -> &QuotaRegistry {
        &self.quotas
    }

    /// Bind the engine to one source and query.
    ///
    /// Resolves the source's quota up front so every fetch of the
    /// returned fetcher shares the same limiter instance.
    pub async fn fetcher(
        &self,
        source: &DataSourceConfig,
        query: &SourceQuery,
    ) -> QueryFetcher<'_> {
        let key = QuotaKey::new(
            &source.name,
            source.requests_per_second,
            source.max_connections,
        );
        let quota = self.quotas.quota_for(&key).await;

        QueryFetcher {
            engine: self,
            source: source.clone(),
            query: query.clone(),
            quota,
            stats: FetchStats::default(),
        }
    }
}

impl std::fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine").finish_non_exhaustive()
    }
}

/// One source and query bound to an engine.
///
/// Implements [`PageFetcher`], so a [`ChunkStream`] built from it pulls
/// pages through the full pipeline: cache, quota, transport, transform.
pub struct QueryFetcher<'e> {
    engine: &'e FetchEngine,
    source: DataSourceConfig,
    query: SourceQuery,
    quota: Arc<SourceQuota>,
    stats: FetchStats,
}

impl QueryFetcher<'_> {
    /// Start a chunk stream over the query's pagination strategy.
    ///
    /// Strategy construction validates the pagination spec and fails
    /// fatally when a required parameter is missing.
    pub fn stream(&self) -> Result<ChunkStream<'_>> {
        let paginator =
            build_paginator(&self.query.pagination, self.source.base_url.as_deref())?;
        Ok(ChunkStream::new(self, paginator))
    }

    /// Counters for this fetcher so far
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolve the request URL and merge static and per-page values
    /// into an immutable descriptor
    fn build_descriptor(&self, request: &PageRequest) -> RequestDescriptor {
        let url = resolve_url(
            self.source.base_url.as_deref(),
            &self.query.path,
            request.url.as_deref(),
        );

        // Per-page values replace static ones on key collision
        let mut params: HashMap<&str, &str> = self
            .query
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for (key, value) in &request.query_params {
            params.insert(key, value);
        }
        let query: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut headers: HashMap<&str, &str> = self
            .query
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for (key, value) in &request.headers {
            headers.insert(key, value);
        }
        let headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let body = request.merged_body(self.query.body.as_ref());

        RequestDescriptor::new(self.query.method, url, query, headers, body)
    }
}

#[async_trait]
impl PageFetcher for QueryFetcher<'_> {
    async fn fetch(&self, request: &PageRequest) -> Result<Chunk> {
        let descriptor = self.build_descriptor(request);
        let fingerprint = descriptor.fingerprint();

        if self.source.caching_enabled() {
            if let Some(entry) = self
                .engine
                .cache
                .get(fingerprint, self.source.cache_ttl_ms)
                .await
            {
                debug!("Cache hit for {fingerprint}");
                self.stats.add_cache_hit();

                let envelope = entry.to_envelope()?;
                let value = parse_body(&envelope.body)?;
                return Ok(Chunk {
                    value,
                    status: envelope.status,
                    headers: envelope.headers,
                    from_cache: true,
                });
            }
        }

        self.stats.add_request();
        let envelope = self
            .quota
            .run(self.engine.executor.execute(&descriptor))
            .await?;

        self.engine.dumper.dump(fingerprint, &envelope.body);

        if self.source.caching_enabled() {
            // Cache failures degrade silently; the fetch itself succeeded
            if let Err(e) = self.engine.cache.put(fingerprint, &envelope).await {
                warn!("Failed to cache response for {fingerprint}: {e}");
            }
        }

        let value = parse_body(&envelope.body)?;
        self.stats.add_records(body_record_count(&value) as u64);

        Ok(Chunk {
            value,
            status: envelope.status,
            headers: envelope.headers,
            from_cache: false,
        })
    }
}

impl std::fmt::Debug for QueryFetcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFetcher")
            .field("source", &self.source.name)
            .field("query", &self.query.name)
            .finish_non_exhaustive()
    }
}

/// Resolve the effective URL for one fetch.
///
/// A per-page override (link-style pagination) wins outright; an
/// absolute query path passes through; otherwise the path joins the
/// source base URL.
fn resolve_url(base: Option<&str>, path: &str, override_url: Option<&str>) -> String {
    if let Some(url) = override_url {
        return url.to_string();
    }

    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match base {
        Some(base) if path.is_empty() => base.to_string(),
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
        None => path.to_string(),
    }
}
