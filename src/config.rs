//! Configuration types for data-source definitions
//!
//! This module contains the configuration structures used to define data
//! sources and their queries in YAML format, plus the engine's own
//! runtime settings (cache sizing, debug switches) read from the
//! environment.

use crate::error::{Error, Result};
use crate::pagination::PaginationSpec;
use crate::types::{JsonValue, Method, StringMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Data Source
// ============================================================================

/// A data source: one remote API plus its request quotas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Unique source name, also the quota sharing key
    pub name: String,

    /// Base URL for API requests. Absent or non-HTTP URLs disable
    /// pagination for every query on this source.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum request rate (0 = unlimited)
    #[serde(default)]
    pub requests_per_second: u32,

    /// Maximum concurrent requests (0 = unlimited)
    #[serde(default)]
    pub max_connections: u32,

    /// Cache freshness window in milliseconds (0 = caching disabled)
    #[serde(default)]
    pub cache_ttl_ms: u64,
}

impl DataSourceConfig {
    /// Whether responses for this source are cached at all
    pub fn caching_enabled(&self) -> bool {
        self.cache_ttl_ms > 0
    }
}

// ============================================================================
// Query
// ============================================================================

/// One named query against a data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceQuery {
    /// Query name, unique within the definition file
    pub name: String,

    /// HTTP method
    #[serde(default)]
    pub method: Method,

    /// Path relative to the source base URL (or an absolute URL)
    #[serde(default)]
    pub path: String,

    /// Static query parameters sent on every request
    #[serde(default)]
    pub params: StringMap,

    /// Static headers sent on every request
    #[serde(default)]
    pub headers: StringMap,

    /// Static JSON body (GraphQL queries put the document here)
    #[serde(default)]
    pub body: Option<JsonValue>,

    /// Pagination behavior for this query
    #[serde(default)]
    pub pagination: PaginationSpec,
}

// ============================================================================
// Definition File
// ============================================================================

/// Complete definition loaded from one YAML file: a source and its
/// queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionFile {
    /// The data source
    pub source: DataSourceConfig,

    /// Queries against the source
    #[serde(default)]
    pub queries: Vec<SourceQuery>,
}

impl DefinitionFile {
    /// Find a query by name
    pub fn query(&self, name: &str) -> Option<&SourceQuery> {
        self.queries.iter().find(|q| q.name == name)
    }

    /// Validate the definition beyond what serde enforces.
    ///
    /// Checks name presence, query-name uniqueness, and that a present
    /// base URL actually parses.
    pub fn validate(&self) -> Result<()> {
        if self.source.name.is_empty() {
            return Err(Error::config("Data source name must not be empty"));
        }

        if let Some(base_url) = &self.source.base_url {
            if base_url.starts_with("http://") || base_url.starts_with("https://") {
                url::Url::parse(base_url)?;
            }
        }

        let mut seen = std::collections::HashSet::new();
        for query in &self.queries {
            if query.name.is_empty() {
                return Err(Error::config("Query name must not be empty"));
            }
            if !seen.insert(query.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate query name: {}",
                    query.name
                )));
            }
        }

        Ok(())
    }
}

/// Load a definition file from a YAML path
pub fn load_definition(path: impl AsRef<Path>) -> Result<DefinitionFile> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    load_definition_from_str(&content)
}

/// Load a definition from a YAML string
pub fn load_definition_from_str(content: &str) -> Result<DefinitionFile> {
    let definition: DefinitionFile = serde_yaml::from_str(content)?;
    definition.validate()?;
    Ok(definition)
}

// ============================================================================
// Engine Config
// ============================================================================

/// Environment variable enabling the raw-body debug dump
pub const ENV_DUMP_BODIES: &str = "PAGINATE_CDK_DUMP_BODIES";
/// Environment variable overriding the hot cache capacity
pub const ENV_CACHE_CAPACITY: &str = "PAGINATE_CDK_CACHE_CAPACITY";
/// Environment variable overriding the disk cache directory
pub const ENV_CACHE_DIR: &str = "PAGINATE_CDK_CACHE_DIR";

/// Engine runtime settings, independent of any data source
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hot cache capacity in entries
    pub cache_capacity: usize,

    /// Directory for demoted cache entries and body dumps
    pub cache_dir: PathBuf,

    /// Persist raw response bodies for inspection
    pub dump_bodies: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            cache_dir: std::env::temp_dir().join("paginate-cdk-cache"),
            dump_bodies: false,
        }
    }
}

impl EngineConfig {
    /// Build the config from the environment, falling back to defaults
    /// for anything unset or unparseable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_CACHE_CAPACITY) {
            if let Ok(capacity) = value.parse::<usize>() {
                if capacity > 0 {
                    config.cache_capacity = capacity;
                }
            }
        }

        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            if !dir.is_empty() {
                config.cache_dir = PathBuf::from(dir);
            }
        }

        if let Ok(value) = std::env::var(ENV_DUMP_BODIES) {
            config.dump_bodies = matches!(value.as_str(), "1" | "true" | "yes");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationSpec;
    use pretty_assertions::assert_eq;

    const DEFINITION: &str = r#"
source:
  name: petstore
  base_url: https://api.petstore.example.com
  requests_per_second: 5
  max_connections: 2
  cache_ttl_ms: 60000
queries:
  - name: pets
    path: /v2/pets
    params:
      status: available
    pagination:
      type: page_number
      page_param:
        location: query
        value: page
      record_count_path: meta.count
      first_page_index: 1
  - name: orders
    method: POST
    path: /v2/orders/search
    body:
      status: placed
"#;

    #[test]
    fn test_load_definition_from_str() {
        let definition = load_definition_from_str(DEFINITION).unwrap();
        assert_eq!(definition.source.name, "petstore");
        assert_eq!(definition.source.requests_per_second, 5);
        assert!(definition.source.caching_enabled());
        assert_eq!(definition.queries.len(), 2);

        let pets = definition.query("pets").unwrap();
        assert_eq!(pets.method, Method::GET);
        assert_eq!(pets.params.get("status"), Some(&"available".to_string()));
        assert_eq!(pets.pagination.kind(), "page_number");

        let orders = definition.query("orders").unwrap();
        assert_eq!(orders.method, Method::POST);
        assert_eq!(orders.pagination, PaginationSpec::None);
    }

    #[test]
    fn test_defaults_applied() {
        let definition = load_definition_from_str("source:\n  name: bare\n").unwrap();
        assert_eq!(definition.source.base_url, None);
        assert_eq!(definition.source.requests_per_second, 0);
        assert!(!definition.source.caching_enabled());
        assert!(definition.queries.is_empty());
    }

    #[test]
    fn test_duplicate_query_names_rejected() {
        let yaml = r#"
source:
  name: dup
queries:
  - name: a
  - name: a
"#;
        let err = load_definition_from_str(yaml).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let yaml = "source:\n  name: bad\n  base_url: \"http://\"\n";
        let err = load_definition_from_str(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_missing_file_error() {
        let err = load_definition("/nonexistent/definition.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_capacity, 256);
        assert!(!config.dump_bodies);
    }
}
