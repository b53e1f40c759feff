//! HTTP execution layer
//!
//! Builds immutable request descriptors and executes them against the
//! transport, producing response envelopes with status, headers, and
//! body bytes. Retries, TLS, and redirects are transport concerns and
//! live in the underlying reqwest configuration.

mod client;
mod request;

pub use client::{ExecutorConfig, ExecutorConfigBuilder, HttpExecutor, ResponseEnvelope};
pub use request::RequestDescriptor;
