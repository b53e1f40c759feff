// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Paginate CDK
//!
//! A paginated REST/GraphQL JSON ingestion engine: declare a data
//! source, its quotas, and a pagination contract in YAML, then stream
//! every page of results as parsed JSON chunks.
//!
//! ## Features
//!
//! - **Pagination strategies**: page number, page count, offset,
//!   total-count variants, next-link, vendor cursor, and GraphQL
//!   page/cursor progress behind one `Paginator` interface
//! - **Per-source quotas**: request-rate and connection limits shared
//!   across every query on a source
//! - **Two-tier response cache**: hot LRU tier with idempotent disk
//!   demotion, keyed by stable request fingerprints
//! - **Lenient transformation**: malformed-prefix sanitization,
//!   absence-tolerant JSON path lookup, uniform record-count shapes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paginate_cdk::config::{load_definition, EngineConfig};
//! use paginate_cdk::engine::FetchEngine;
//! use paginate_cdk::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let definition = load_definition("sources/petstore.yaml")?;
//!     let engine = FetchEngine::new(EngineConfig::from_env())?;
//!
//!     let query = definition.query("pets").expect("query defined");
//!     let fetcher = engine.fetcher(&definition.source, query).await;
//!
//!     let mut stream = fetcher.stream()?;
//!     while let Some(chunk) = stream.try_next().await? {
//!         println!("{}", chunk.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the engine
pub mod error;

/// Common types and type aliases
pub mod types;

/// Response transformation: sanitization, parsing, JSON path lookup
pub mod transform;

/// HTTP execution layer
pub mod http;

/// Two-tier response cache
pub mod cache;

/// Per-source quota management
pub mod quota;

/// Pagination strategies
pub mod pagination;

/// Fetch pipeline
pub mod engine;

/// Configuration and definition files
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_definition, load_definition_from_str, DefinitionFile};
pub use engine::FetchEngine;
pub use pagination::{Chunk, ChunkStream, PaginationSpec};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
