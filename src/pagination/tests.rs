//! Tests for pagination strategies and the chunk stream

use super::*;
use crate::error::Error;
use crate::types::JsonValue;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Scripted fetcher
// ============================================================================

/// Serves a fixed script of responses and records every request issued
struct ScriptedFetcher {
    responses: Mutex<VecDeque<(JsonValue, HeaderMap)>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedFetcher {
    fn new(bodies: Vec<JsonValue>) -> Self {
        let responses = bodies
            .into_iter()
            .map(|body| (body, HeaderMap::new()))
            .collect();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn with_headers(responses: Vec<(JsonValue, HeaderMap)>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn param_values(&self, key: &str) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .map(|r| r.query_params.get(key).cloned())
            .collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &PageRequest) -> crate::error::Result<Chunk> {
        self.requests.lock().unwrap().push(request.clone());
        let (value, headers) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((JsonValue::Null, HeaderMap::new()));
        Ok(Chunk {
            value,
            status: 200,
            headers,
            from_cache: false,
        })
    }
}

fn link_headers(next_url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "link",
        HeaderValue::from_str(&format!("<{next_url}>; rel=\"next\"")).unwrap(),
    );
    headers
}

// ============================================================================
// Unpaged
// ============================================================================

#[tokio::test]
async fn test_unpaged_issues_exactly_one_request() {
    let fetcher = ScriptedFetcher::new(vec![json!({"data": [1, 2]})]);
    let mut stream = ChunkStream::new(&fetcher, Box::new(UnpagedPaginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(fetcher.request_count(), 1);
}

// ============================================================================
// Look-ahead caching
// ============================================================================

#[tokio::test]
async fn test_repeated_has_next_issues_no_second_request() {
    let fetcher = ScriptedFetcher::new(vec![json!({"data": []})]);
    let mut stream = ChunkStream::new(&fetcher, Box::new(UnpagedPaginator));

    assert!(stream.has_next().await.unwrap());
    assert!(stream.has_next().await.unwrap());
    assert!(stream.has_next().await.unwrap());
    assert_eq!(fetcher.request_count(), 1);

    assert!(stream.try_next().await.unwrap().is_some());
    assert!(!stream.has_next().await.unwrap());
    assert_eq!(fetcher.request_count(), 1);
}

#[tokio::test]
async fn test_into_stream_yields_chunks_then_terminates() {
    use futures::StreamExt;

    let fetcher = ScriptedFetcher::new(vec![
        json!({"meta": {"count": 1}}),
        json!({"meta": {"count": 0}}),
    ]);
    let stream = ChunkStream::new(&fetcher, page_number(1));

    let results: Vec<_> = stream.into_stream().collect().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

// ============================================================================
// Page Number
// ============================================================================

fn page_number(first: u64) -> Box<dyn Paginator> {
    Box::new(
        PageNumberPaginator::new(
            ParameterDescriptor::query("page"),
            "meta.count",
            first,
            None,
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn test_page_number_stops_on_zero_count() {
    // Count path yields 0 on page 3: exactly pages 1 and 2 are yielded
    let fetcher = ScriptedFetcher::new(vec![
        json!({"meta": {"count": 5}, "items": [1, 2, 3, 4, 5]}),
        json!({"meta": {"count": 2}, "items": [6, 7]}),
        json!({"meta": {"count": 0}, "items": []}),
    ]);
    let mut stream = ChunkStream::new(&fetcher, page_number(1));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(fetcher.request_count(), 3);
    assert_eq!(
        fetcher.param_values("page"),
        vec![
            Some("1".to_string()),
            Some("2".to_string()),
            Some("3".to_string())
        ]
    );
}

#[tokio::test]
async fn test_page_number_accepts_count_in_one_element_array() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"meta": {"count": [3]}}),
        json!({"meta": {"count": [0]}}),
    ]);
    let mut stream = ChunkStream::new(&fetcher, page_number(1));

    assert_eq!(stream.collect_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_number_missing_count_path_terminates() {
    let fetcher = ScriptedFetcher::new(vec![json!({"items": [1]})]);
    let mut stream = ChunkStream::new(&fetcher, page_number(1));

    // Absent count means "zero records": the page is discarded
    assert_eq!(stream.collect_all().await.unwrap().len(), 0);
    assert_eq!(fetcher.request_count(), 1);
}

#[tokio::test]
async fn test_page_number_absent_body_terminates() {
    let fetcher = ScriptedFetcher::new(vec![JsonValue::Null]);
    let mut stream = ChunkStream::new(&fetcher, page_number(0));

    assert_eq!(stream.collect_all().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_page_number_writes_to_header_location() {
    let fetcher = ScriptedFetcher::new(vec![json!({"meta": {"count": 0}})]);
    let paginator = PageNumberPaginator::new(
        ParameterDescriptor::header("X-Page"),
        "meta.count",
        1,
        None,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));
    stream.collect_all().await.unwrap();

    let requests = fetcher.requests();
    assert_eq!(requests[0].headers.get("X-Page"), Some(&"1".to_string()));
}

#[test]
fn test_page_number_requires_page_param() {
    let result = PageNumberPaginator::new(
        ParameterDescriptor::query(""),
        "meta.count",
        1,
        None,
    );
    assert!(matches!(
        result.unwrap_err(),
        Error::MissingPaginationParameter { .. }
    ));

    let result =
        PageNumberPaginator::new(ParameterDescriptor::query("page"), "", 1, None);
    assert!(matches!(
        result.unwrap_err(),
        Error::MissingPaginationParameter { parameter } if parameter == "record count path"
    ));
}

// ============================================================================
// Page Count
// ============================================================================

#[tokio::test]
async fn test_page_count_fetches_discovered_pages_in_order() {
    // Discovery response reports 3 total pages; page params 1,2,3 are
    // written in order and exactly 3 chunks are produced
    let fetcher = ScriptedFetcher::new(vec![
        json!({"totalPages": 3}),
        json!({"items": [1]}),
        json!({"items": [2]}),
        json!({"items": [3]}),
    ]);
    let paginator = PageCountPaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::json_path("totalPages"),
        1,
        None,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].value, json!({"items": [1]}));
    assert_eq!(fetcher.request_count(), 4);
    assert_eq!(
        fetcher.param_values("page"),
        vec![
            None,
            Some("1".to_string()),
            Some("2".to_string()),
            Some("3".to_string())
        ]
    );
}

#[tokio::test]
async fn test_page_count_zero_based_indexing() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"totalPages": 2}),
        json!({"items": [1]}),
        json!({"items": [2]}),
    ]);
    let paginator = PageCountPaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::json_path("totalPages"),
        0,
        None,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 2);
    assert_eq!(
        fetcher.param_values("page"),
        vec![None, Some("0".to_string()), Some("1".to_string())]
    );
}

#[tokio::test]
async fn test_page_count_unparseable_total_is_one_page() {
    let fetcher = ScriptedFetcher::new(vec![json!({"items": [1, 2]})]);
    let paginator = PageCountPaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::json_path("totalPages"),
        1,
        None,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    // Not an error: the discovery page is the only chunk
    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(fetcher.request_count(), 1);
}

#[tokio::test]
async fn test_page_count_reads_total_from_header() {
    let mut headers = HeaderMap::new();
    headers.insert("x-total-pages", HeaderValue::from_static("2"));
    let fetcher = ScriptedFetcher::with_headers(vec![
        (json!({}), headers),
        (json!({"items": [1]}), HeaderMap::new()),
        (json!({"items": [2]}), HeaderMap::new()),
    ]);
    let paginator = PageCountPaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::header("x-total-pages"),
        1,
        None,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 2);
}

// ============================================================================
// Offset
// ============================================================================

#[tokio::test]
async fn test_offset_advances_by_observed_count() {
    // Base record length 10, counts [25, 25, 5]: three requests, done
    // after the third (5 <= 10)
    let fetcher = ScriptedFetcher::new(vec![
        json!({"count": 25}),
        json!({"count": 25}),
        json!({"count": 5}),
    ]);
    let paginator = OffsetPaginator::new(
        ParameterDescriptor::query("offset"),
        "count",
        10,
        0,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(fetcher.request_count(), 3);
    assert_eq!(
        fetcher.param_values("offset"),
        vec![
            Some("0".to_string()),
            Some("25".to_string()),
            Some("50".to_string())
        ]
    );
}

#[tokio::test]
async fn test_offset_starts_at_first_index() {
    let fetcher = ScriptedFetcher::new(vec![json!({"count": 0})]);
    let paginator = OffsetPaginator::new(
        ParameterDescriptor::query("start"),
        "count",
        0,
        100,
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));
    stream.collect_all().await.unwrap();

    assert_eq!(fetcher.param_values("start"), vec![Some("100".to_string())]);
}

// ============================================================================
// Total Count + Offset
// ============================================================================

#[tokio::test]
async fn test_total_count_offset_advances_by_fixed_page_size() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"total": 45, "items": []}),
        json!({"items": []}),
        json!({"items": []}),
    ]);
    let paginator = TotalCountOffsetPaginator::new(
        ParameterDescriptor::query("offset"),
        ParameterDescriptor::json_path("total"),
        0,
        Some(MaxResultsSpec::written(
            ParameterDescriptor::query("limit"),
            20,
        )),
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(
        fetcher.param_values("offset"),
        vec![
            Some("0".to_string()),
            Some("20".to_string()),
            Some("40".to_string())
        ]
    );
    // The page size is auto-injected so the server-observed page size
    // matches the accounting
    assert_eq!(
        fetcher.param_values("limit"),
        vec![
            Some("20".to_string()),
            Some("20".to_string()),
            Some("20".to_string())
        ]
    );
}

#[tokio::test]
async fn test_total_count_offset_missing_total_stops_after_one_page() {
    let fetcher = ScriptedFetcher::new(vec![json!({"items": [1]})]);
    let paginator = TotalCountOffsetPaginator::new(
        ParameterDescriptor::query("offset"),
        ParameterDescriptor::json_path("total"),
        0,
        Some(MaxResultsSpec::value_only(20)),
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 1);
}

#[test]
fn test_total_count_offset_requires_max_results() {
    let result = TotalCountOffsetPaginator::new(
        ParameterDescriptor::query("offset"),
        ParameterDescriptor::json_path("total"),
        0,
        None,
    );
    assert!(matches!(
        result.unwrap_err(),
        Error::MissingPaginationParameter { parameter } if parameter == "max results"
    ));
}

// ============================================================================
// Total Count + Page
// ============================================================================

#[tokio::test]
async fn test_total_count_page_computes_last_page() {
    // total=95, maxResults=20, one-based: lastPage = ceil(95/20) = 5
    let fetcher = ScriptedFetcher::new(vec![
        json!({"total": 95}),
        json!({}),
        json!({}),
        json!({}),
        json!({}),
    ]);
    let paginator = TotalCountPagePaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::json_path("total"),
        1,
        Some(MaxResultsSpec::value_only(20)),
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 5);
    assert_eq!(
        fetcher.param_values("page"),
        vec![
            Some("1".to_string()),
            Some("2".to_string()),
            Some("3".to_string()),
            Some("4".to_string()),
            Some("5".to_string())
        ]
    );
}

#[tokio::test]
async fn test_total_count_page_zero_based() {
    // total=30, maxResults=20, zero-based: pages 0 and 1
    let fetcher = ScriptedFetcher::new(vec![json!({"total": 30}), json!({})]);
    let paginator = TotalCountPagePaginator::new(
        ParameterDescriptor::query("page"),
        ParameterDescriptor::json_path("total"),
        0,
        Some(MaxResultsSpec::value_only(20)),
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 2);
    assert_eq!(
        fetcher.param_values("page"),
        vec![Some("0".to_string()), Some("1".to_string())]
    );
}

// ============================================================================
// Link Iteration
// ============================================================================

#[tokio::test]
async fn test_link_iteration_follows_body_urls() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"next": "https://api.example.com/p2", "items": [1]}),
        json!({"next": "https://api.example.com/p3", "items": [2]}),
        json!({"items": [3]}),
    ]);
    let paginator =
        LinkIterationPaginator::new(ParameterDescriptor::json_path("next")).unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 3);

    let requests = fetcher.requests();
    assert_eq!(requests[0].url, None);
    assert_eq!(requests[1].url, Some("https://api.example.com/p2".to_string()));
    assert_eq!(requests[2].url, Some("https://api.example.com/p3".to_string()));
}

#[tokio::test]
async fn test_link_iteration_follows_link_header_relation() {
    let fetcher = ScriptedFetcher::with_headers(vec![
        (json!({"items": [1]}), link_headers("https://api.example.com/p2")),
        (json!({"items": [2]}), HeaderMap::new()),
    ]);
    let paginator =
        LinkIterationPaginator::new(ParameterDescriptor::link_header("next")).unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(
        fetcher.requests()[1].url,
        Some("https://api.example.com/p2".to_string())
    );
}

#[tokio::test]
async fn test_link_iteration_empty_list_terminates() {
    let fetcher = ScriptedFetcher::new(vec![json!([])]);
    let paginator =
        LinkIterationPaginator::new(ParameterDescriptor::json_path("next")).unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 0);
    assert_eq!(fetcher.request_count(), 1);
}

// ============================================================================
// Cursor Iteration (max_id)
// ============================================================================

#[tokio::test]
async fn test_cursor_iteration_decrements_cursor() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"max_id": 100, "items": [1]}),
        json!({"max_id": 80, "items": [2]}),
        json!({"items": []}),
    ]);
    let paginator = CursorIterationPaginator::new(
        ParameterDescriptor::query("max_id"),
        "max_id",
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(
        fetcher.param_values("max_id"),
        vec![None, Some("99".to_string()), Some("79".to_string())]
    );
}

#[tokio::test]
async fn test_cursor_repeat_raises_non_progress_error() {
    // Two consecutive responses with the identical cursor: the third
    // fetch attempt raises instead of looping
    let fetcher = ScriptedFetcher::new(vec![
        json!({"max_id": 100, "items": [1]}),
        json!({"max_id": 100, "items": [2]}),
    ]);
    let paginator = CursorIterationPaginator::new(
        ParameterDescriptor::query("max_id"),
        "max_id",
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    // Both chunks already yielded remain valid
    assert!(stream.try_next().await.unwrap().is_some());
    assert!(stream.try_next().await.unwrap().is_some());

    let err = stream.try_next().await.unwrap_err();
    assert!(matches!(err, Error::NoProgress { cursor } if cursor == "100"));
    assert_eq!(fetcher.request_count(), 2);
}

#[tokio::test]
async fn test_cursor_absent_terminates() {
    let fetcher = ScriptedFetcher::new(vec![json!({"items": [1]})]);
    let paginator = CursorIterationPaginator::new(
        ParameterDescriptor::query("max_id"),
        "max_id",
    )
    .unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    assert_eq!(stream.collect_all().await.unwrap().len(), 1);
}

// ============================================================================
// GraphQL strategies
// ============================================================================

#[tokio::test]
async fn test_graphql_page_merges_page_into_variables() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": {"count": 2}}),
        json!({"data": {"count": 0}}),
    ]);
    let paginator =
        GraphqlPagePaginator::new("variables.page", "data.count", 1, None).unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));
    stream.collect_all().await.unwrap();

    let requests = fetcher.requests();
    assert_eq!(
        requests[0].body_merges,
        vec![("variables.page".to_string(), json!(1))]
    );
    assert_eq!(
        requests[1].body_merges,
        vec![("variables.page".to_string(), json!(2))]
    );
}

#[tokio::test]
async fn test_graphql_cursor_merges_cursor_into_variables() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": {"pageInfo": {"endCursor": "abc"}}}),
        json!({"data": {"pageInfo": {}}}),
    ]);
    let paginator =
        GraphqlCursorPaginator::new("variables.after", "data.pageInfo.endCursor").unwrap();
    let mut stream = ChunkStream::new(&fetcher, Box::new(paginator));

    let chunks = stream.collect_all().await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(
        fetcher.requests()[1].body_merges,
        vec![("variables.after".to_string(), json!("abc"))]
    );
}

// ============================================================================
// PageRequest / body merge
// ============================================================================

#[test]
fn test_merged_body_preserves_sibling_variables() {
    let mut request = PageRequest::new();
    request
        .body_merges
        .push(("variables.page".to_string(), json!(3)));

    let base = json!({"query": "{ items }", "variables": {"filter": "open"}});
    let merged = request.merged_body(Some(&base)).unwrap();

    assert_eq!(
        merged,
        json!({"query": "{ items }", "variables": {"filter": "open", "page": 3}})
    );
}

#[test]
fn test_merged_body_creates_missing_objects() {
    let mut request = PageRequest::new();
    request
        .body_merges
        .push(("variables.after".to_string(), json!("abc")));

    let merged = request.merged_body(None).unwrap();
    assert_eq!(merged, json!({"variables": {"after": "abc"}}));
}

#[test]
fn test_merged_body_without_merges_passes_base_through() {
    let request = PageRequest::new();
    let base = json!({"query": "{ items }"});
    assert_eq!(request.merged_body(Some(&base)), Some(base));
    assert_eq!(request.merged_body(None), None);
}

// ============================================================================
// Control reads
// ============================================================================

#[test]
fn test_parse_link_header_relations() {
    let header =
        "<https://api.example.com/p2>; rel=\"next\", <https://api.example.com/p1>; rel=\"prev\"";
    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://api.example.com/p2".to_string())
    );
    assert_eq!(
        parse_link_header(header, "prev"),
        Some("https://api.example.com/p1".to_string())
    );
    assert_eq!(parse_link_header(header, "last"), None);
}

#[test]
fn test_read_control_locations() {
    let body = json!({"total": 7});
    let mut headers = HeaderMap::new();
    headers.insert("x-total", HeaderValue::from_static("9"));

    assert_eq!(
        read_numeric_control(&ParameterDescriptor::json_path("total"), &body, &headers),
        Some(7)
    );
    assert_eq!(
        read_numeric_control(&ParameterDescriptor::header("x-total"), &body, &headers),
        Some(9)
    );
    // Query is a write-only location
    assert_eq!(
        read_numeric_control(&ParameterDescriptor::query("total"), &body, &headers),
        None
    );
}

// ============================================================================
// Factory
// ============================================================================

#[test]
fn test_factory_absent_or_non_http_url_is_unpaged() {
    let spec = PaginationSpec::PageNumber {
        page_param: Some(ParameterDescriptor::query("page")),
        record_count_path: Some("count".to_string()),
        first_page_index: 1,
        max_results: None,
    };

    // Absent URL and non-HTTP URL both fall back to unpaged
    assert!(build_paginator(&spec, None).is_ok());
    assert!(build_paginator(&spec, Some("file:///tmp/data.json")).is_ok());
    assert!(build_paginator(&spec, Some("https://api.example.com")).is_ok());
}

#[tokio::test]
async fn test_factory_non_http_url_yields_single_chunk() {
    let spec = PaginationSpec::PageNumber {
        page_param: Some(ParameterDescriptor::query("page")),
        record_count_path: Some("count".to_string()),
        first_page_index: 1,
        max_results: None,
    };
    let paginator = build_paginator(&spec, Some("ftp://host/data")).unwrap();

    let fetcher = ScriptedFetcher::new(vec![json!({"count": 100})]);
    let mut stream = ChunkStream::new(&fetcher, paginator);
    assert_eq!(stream.collect_all().await.unwrap().len(), 1);
}

#[test]
fn test_factory_reports_missing_parameters() {
    let spec = PaginationSpec::PageNumber {
        page_param: None,
        record_count_path: Some("count".to_string()),
        first_page_index: 1,
        max_results: None,
    };
    let err = build_paginator(&spec, Some("https://api.example.com")).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingPaginationParameter { parameter } if parameter == "page parameter"
    ));
}

#[test]
fn test_factory_rejects_link_header_write_target() {
    let spec = PaginationSpec::PageNumber {
        page_param: Some(ParameterDescriptor::link_header("next")),
        record_count_path: Some("count".to_string()),
        first_page_index: 1,
        max_results: None,
    };
    let err = build_paginator(&spec, Some("https://api.example.com")).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[test]
fn test_pagination_spec_yaml_round_trip() {
    let yaml = r#"
type: offset
offset_param:
  location: query
  value: offset
record_count_path: count
base_record_length: 10
first_index: 0
"#;
    let spec: PaginationSpec = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(spec.kind(), "offset");
    assert!(build_paginator(&spec, Some("https://api.example.com")).is_ok());
}
