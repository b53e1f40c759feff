//! Pagination types and traits
//!
//! Defines the core abstractions shared by all strategies: where a
//! pagination control value lives ([`ParameterDescriptor`]), the
//! per-iteration request overrides ([`PageRequest`]), the explicit
//! iteration state threaded through every step, and the [`Paginator`]
//! contract itself.

use crate::error::{Error, Result};
use crate::transform::{lookup, Lookup};
use crate::types::{JsonValue, StringMap};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a pagination control value is read from or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// URL query parameter (write-only)
    Query,
    /// HTTP header
    Header,
    /// JSON path into the request or response body
    JsonPath,
    /// RFC 5988 `Link:` response header, selected by relation name
    LinkHeader,
}

/// Describes one pagination control parameter. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Where the value lives
    pub location: ParamLocation,
    /// Parameter name, header name, or JSON path (unused for
    /// `LinkHeader`)
    #[serde(default)]
    pub value: String,
    /// Relation name for `LinkHeader` reads (default: "next")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_relation: Option<String>,
}

impl ParameterDescriptor {
    /// Create a query-parameter descriptor
    pub fn query(value: impl Into<String>) -> Self {
        Self {
            location: ParamLocation::Query,
            value: value.into(),
            link_relation: None,
        }
    }

    /// Create a header descriptor
    pub fn header(value: impl Into<String>) -> Self {
        Self {
            location: ParamLocation::Header,
            value: value.into(),
            link_relation: None,
        }
    }

    /// Create a JSON-path descriptor
    pub fn json_path(value: impl Into<String>) -> Self {
        Self {
            location: ParamLocation::JsonPath,
            value: value.into(),
            link_relation: None,
        }
    }

    /// Create a link-header descriptor for a relation
    pub fn link_header(relation: impl Into<String>) -> Self {
        Self {
            location: ParamLocation::LinkHeader,
            value: String::new(),
            link_relation: Some(relation.into()),
        }
    }

    /// Reject descriptors that cannot carry an outgoing value.
    ///
    /// `LinkHeader` is response-only; a spec configuring it as a write
    /// target is invalid and fails at strategy construction.
    pub fn validate_writable(&self, parameter: &str) -> Result<()> {
        if self.location == ParamLocation::LinkHeader {
            return Err(Error::InvalidConfigValue {
                field: parameter.to_string(),
                message: "link_header cannot be written to a request".to_string(),
            });
        }
        if self.value.is_empty() {
            return Err(Error::missing_parameter(parameter));
        }
        Ok(())
    }
}

/// Per-iteration overrides applied on top of the base query when
/// building the next request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Query parameters added or replaced
    pub query_params: StringMap,
    /// Headers added or replaced
    pub headers: StringMap,
    /// JSON-path merges into the request body (path, value)
    pub body_merges: Vec<(String, JsonValue)>,
    /// Replacement URL (link-style strategies)
    pub url: Option<String>,
}

impl PageRequest {
    /// Create an empty page request (no overrides)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a page request that replaces the URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Write a control value at the location a descriptor names.
    ///
    /// Query and header values are flat strings; JSON-path values are
    /// merged into the existing body object rather than overwriting it.
    pub fn write(&mut self, descriptor: &ParameterDescriptor, value: impl Into<String>) {
        let value = value.into();
        match descriptor.location {
            ParamLocation::Query => {
                self.query_params.insert(descriptor.value.clone(), value);
            }
            ParamLocation::Header => {
                self.headers.insert(descriptor.value.clone(), value);
            }
            ParamLocation::JsonPath => {
                // Numeric values merge as numbers so GraphQL variables
                // keep their types
                let json_value = value
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or(Value::String(value));
                self.body_merges.push((descriptor.value.clone(), json_value));
            }
            ParamLocation::LinkHeader => {
                // Response-only location, rejected at construction
            }
        }
    }

    /// Apply this request's body merges on top of a base body.
    ///
    /// Each merge navigates (and creates) objects along a dot path and
    /// sets the leaf, preserving sibling keys: a GraphQL `variables`
    /// object keeps its other entries.
    pub fn merged_body(&self, base: Option<&JsonValue>) -> Option<JsonValue> {
        if self.body_merges.is_empty() {
            return base.cloned();
        }

        let mut body = match base {
            Some(v) => v.clone(),
            None => Value::Object(serde_json::Map::new()),
        };

        for (path, value) in &self.body_merges {
            merge_at_path(&mut body, path, value.clone());
        }

        Some(body)
    }
}

/// Set `value` at a dot path inside `target`, creating intermediate
/// objects as needed and leaving sibling keys untouched
fn merge_at_path(target: &mut JsonValue, path: &str, value: JsonValue) {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut current = target;

    let parts: Vec<&str> = path.split('.').collect();
    for (i, part) in parts.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("object ensured above");

        if i == parts.len() - 1 {
            map.insert((*part).to_string(), value);
            return;
        }

        current = map
            .entry((*part).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

/// Outcome of processing one response
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// Yield this response as a chunk, then issue the given request
    Continue(PageRequest),
    /// Discard this response and issue the given request (discovery
    /// fetches that only carry pagination metadata)
    Skip(PageRequest),
    /// Yield this response as the final chunk
    Complete,
    /// Discard this response and finish (empty terminal page)
    Discard,
}

impl NextPage {
    /// Whether iteration continues after this outcome
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_) | Self::Skip(_))
    }

    /// Whether iteration is finished
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Complete | Self::Discard)
    }
}

/// Explicit per-execution iteration state.
///
/// Owned by one strategy instance for one query execution; mutated only
/// by `process_response` steps and destroyed when iteration completes.
#[derive(Debug, Clone, Default)]
pub struct IterationState {
    /// Current page number (page-based strategies)
    pub page: u64,
    /// Current offset (offset-based strategies)
    pub offset: u64,
    /// Most recently extracted cursor value
    pub cursor: Option<String>,
    /// Cursor extracted one step earlier, for progress checks
    pub previous_cursor: Option<String>,
    /// Total record or page count, once discovered
    pub total: Option<u64>,
    /// Records accounted for so far
    pub fetched: u64,
    /// Responses processed so far (including discarded ones)
    pub responses_seen: u64,
    /// Iteration complete?
    pub done: bool,
}

impl IterationState {
    /// Create a fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state positioned at a page
    pub fn at_page(page: u64) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Mark iteration complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Record a newly extracted cursor, rotating the previous one
    pub fn advance_cursor(&mut self, cursor: String) {
        self.previous_cursor = self.cursor.take();
        self.cursor = Some(cursor);
    }

    /// Add to the fetched-records tally
    pub fn add_fetched(&mut self, count: u64) {
        self.fetched += count;
    }
}

/// Core contract for pagination strategies.
///
/// One state machine per server-side pagination contract: given the
/// previous response, decide what request (if any) comes next.
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Position a fresh state before the first request (first page
    /// index, first offset). Default: leave the zeroed state alone.
    fn init_state(&self, state: &mut IterationState) {
        let _ = state;
    }

    /// Overrides for the first request of an iteration
    fn initial_request(&self, state: &IterationState) -> PageRequest;

    /// Inspect a response and decide the next step.
    ///
    /// Returns an error only for fatal conditions (a cursor that fails
    /// to advance); data absence is always mapped to termination, not
    /// failure.
    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage>;
}

/// Read a control value from a response at the location a descriptor
/// names. `Query` is a write-only location and never resolves.
pub fn read_control(
    descriptor: &ParameterDescriptor,
    body: &JsonValue,
    headers: &HeaderMap,
) -> Option<JsonValue> {
    match descriptor.location {
        ParamLocation::Query => None,
        ParamLocation::Header => headers
            .get(descriptor.value.as_str())
            .and_then(|v| v.to_str().ok())
            .map(|s| Value::String(s.to_string())),
        ParamLocation::JsonPath => lookup(body, &descriptor.value).into_value(),
        ParamLocation::LinkHeader => {
            let relation = descriptor.link_relation.as_deref().unwrap_or("next");
            headers
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(|header| parse_link_header(header, relation))
                .map(Value::String)
        }
    }
}

/// Read a numeric control value, accepting the scalar and one-element
/// array shapes uniformly
pub fn read_numeric_control(
    descriptor: &ParameterDescriptor,
    body: &JsonValue,
    headers: &HeaderMap,
) -> Option<u64> {
    read_control(descriptor, body, headers).as_ref().and_then(crate::transform::record_count)
}

/// Read a record count from a JSON path, mapping absence to `None`
pub fn read_count_at_path(body: &JsonValue, path: &str) -> Option<u64> {
    match lookup(body, path) {
        Lookup::Found(value) => crate::transform::record_count(&value),
        Lookup::NotFound => None,
    }
}

/// Parse an RFC 5988 `Link` header and extract the URL for a relation
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // Link header format: <url>; rel="next", <url>; rel="prev"
    for part in header.split(',') {
        let part = part.trim();
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(stripped) = segment.strip_prefix("rel=") {
                let rel_value = stripped.trim_matches('"').trim_matches('\'');
                rel = Some(rel_value);
            }
        }

        if let (Some(u), Some(r)) = (url, rel) {
            if r == target_rel {
                return Some(u.to_string());
            }
        }
    }

    None
}

// ============================================================================
// Pagination spec (configuration)
// ============================================================================

/// Max-results-per-page setting.
///
/// When `write` is enabled the strategy auto-injects the parameter into
/// outgoing requests, so the server-observed page size always matches
/// the strategy's internal accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxResultsSpec {
    /// Where to write the parameter, when writing is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<ParameterDescriptor>,
    /// Page size the strategy accounts in
    pub value: u64,
    /// Inject the parameter into outgoing requests
    #[serde(default)]
    pub write: bool,
}

impl MaxResultsSpec {
    /// A max-results value that is only used for accounting
    pub fn value_only(value: u64) -> Self {
        Self {
            param: None,
            value,
            write: false,
        }
    }

    /// A max-results value written to every outgoing request
    pub fn written(param: ParameterDescriptor, value: u64) -> Self {
        Self {
            param: Some(param),
            value,
            write: true,
        }
    }

    /// Inject the parameter into a page request when write-enabled
    pub fn inject(&self, request: &mut PageRequest) {
        if self.write {
            if let Some(param) = &self.param {
                request.write(param, self.value.to_string());
            }
        }
    }
}

/// Tagged pagination configuration.
///
/// Each variant carries only the parameters relevant to its strategy;
/// strategies validate at construction that their required fields are
/// populated and fail fatally otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationSpec {
    /// Single request, no pagination
    #[default]
    None,

    /// Incrementing page counter terminated by a zero record count
    PageNumber {
        /// Where the page number is written
        page_param: Option<ParameterDescriptor>,
        /// JSON path to the per-page record count
        record_count_path: Option<String>,
        /// First page index (0 or 1)
        #[serde(default)]
        first_page_index: u64,
        /// Optional page size
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_results: Option<MaxResultsSpec>,
    },

    /// Total page count discovered from the first response
    PageCount {
        /// Where the page number is written on subsequent requests
        page_param: Option<ParameterDescriptor>,
        /// Where the total page count is read from
        total_pages_param: Option<ParameterDescriptor>,
        /// First page index (0 or 1)
        #[serde(default)]
        first_page_index: u64,
        /// Optional page size
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_results: Option<MaxResultsSpec>,
    },

    /// Offset advanced by the observed record count
    Offset {
        /// Where the offset is written
        offset_param: Option<ParameterDescriptor>,
        /// JSON path to the per-page record count
        record_count_path: Option<String>,
        /// Baseline record length; counts at or below it end iteration
        #[serde(default)]
        base_record_length: u64,
        /// First offset value
        #[serde(default)]
        first_index: u64,
    },

    /// Total record count discovered once, offset advanced by a fixed
    /// page size
    TotalCountOffset {
        /// Where the offset is written
        offset_param: Option<ParameterDescriptor>,
        /// Where the total record count is read from
        total_count_param: Option<ParameterDescriptor>,
        /// First offset value
        #[serde(default)]
        first_index: u64,
        /// Fixed page size (required)
        max_results: Option<MaxResultsSpec>,
    },

    /// Total record count discovered once, pages computed from it
    TotalCountPage {
        /// Where the page number is written
        page_param: Option<ParameterDescriptor>,
        /// Where the total record count is read from
        total_count_param: Option<ParameterDescriptor>,
        /// First page index (0 or 1)
        #[serde(default)]
        first_page_index: u64,
        /// Fixed page size (required)
        max_results: Option<MaxResultsSpec>,
    },

    /// Next-page URL extracted from the prior response
    LinkIteration {
        /// Where the next URL is read from (JSON path, header, or
        /// link-header relation)
        next_url_param: Option<ParameterDescriptor>,
    },

    /// Vendor cursor (max_id-style): opaque numeric cursor, decremented
    /// before reissue, with non-progress detection
    CursorIteration {
        /// Where the cursor is written
        cursor_param: Option<ParameterDescriptor>,
        /// JSON path the cursor is read from
        cursor_path: Option<String>,
    },

    /// Page-number progress with the value merged into GraphQL
    /// variables
    GraphqlPage {
        /// JSON path into the variables object
        page_path: Option<String>,
        /// JSON path to the per-page record count
        record_count_path: Option<String>,
        /// First page index (0 or 1)
        #[serde(default)]
        first_page_index: u64,
        /// Optional page size
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_results: Option<MaxResultsSpec>,
    },

    /// Cursor progress with the value merged into GraphQL variables
    GraphqlCursor {
        /// JSON path into the variables object
        cursor_write_path: Option<String>,
        /// JSON path the cursor is read from in the response
        cursor_path: Option<String>,
    },
}

impl PaginationSpec {
    /// Human-readable kind name for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PageNumber { .. } => "page_number",
            Self::PageCount { .. } => "page_count",
            Self::Offset { .. } => "offset",
            Self::TotalCountOffset { .. } => "total_count_offset",
            Self::TotalCountPage { .. } => "total_count_page",
            Self::LinkIteration { .. } => "link_iteration",
            Self::CursorIteration { .. } => "cursor_iteration",
            Self::GraphqlPage { .. } => "graphql_page",
            Self::GraphqlCursor { .. } => "graphql_cursor",
        }
    }
}

/// Require a populated descriptor, naming the parameter in the error
pub fn require_param<'a>(
    param: &'a Option<ParameterDescriptor>,
    name: &str,
) -> Result<&'a ParameterDescriptor> {
    param
        .as_ref()
        .ok_or_else(|| Error::missing_parameter(name))
}

/// Require a populated string field, naming the parameter in the error
pub fn require_field<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    match field.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::missing_parameter(name)),
    }
}
