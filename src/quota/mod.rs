//! Per-data-source request quotas
//!
//! Bounds the aggregate request rate and concurrency per logical data
//! source. Each quota combines an optional token-bucket rate limit and
//! an optional bounded connection semaphore; acquisition blocks rather
//! than failing (backpressure over rejection).

mod manager;

pub use manager::{QuotaKey, QuotaRegistry, RegistryConfig, SourceQuota};
