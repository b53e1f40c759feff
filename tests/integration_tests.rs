//! End-to-end tests: definition file -> engine -> HTTP -> chunks

use paginate_cdk::config::{load_definition_from_str, EngineConfig};
use paginate_cdk::engine::FetchEngine;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_with_dir(dir: &std::path::Path) -> FetchEngine {
    FetchEngine::new(EngineConfig {
        cache_capacity: 16,
        cache_dir: dir.to_path_buf(),
        dump_bodies: false,
    })
    .unwrap()
}

fn definition(base_url: &str, extra: &str) -> String {
    format!(
        r#"
source:
  name: integration
  base_url: {base_url}
{extra}
"#
    )
}

#[tokio::test]
async fn test_offset_pagination_from_yaml_definition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 25})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("offset", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = definition(
        &server.uri(),
        r#"queries:
  - name: records
    path: /records
    pagination:
      type: offset
      offset_param:
        location: query
        value: offset
      record_count_path: count
      base_record_length: 10
"#,
    );
    let definition = load_definition_from_str(&yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());
    let fetcher = engine
        .fetcher(&definition.source, definition.query("records").unwrap())
        .await;

    let chunks = fetcher.stream().unwrap().collect_all().await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(fetcher.stats().requests, 2);
}

#[tokio::test]
async fn test_link_header_pagination_end_to_end() {
    let server = MockServer::start().await;
    let next = format!("{}/records?cursor=n2", server.uri());
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("cursor", "n2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{next}>; rel=\"next\"").as_str())
                .set_body_json(json!([{"id": 1}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let yaml = definition(
        &server.uri(),
        r#"queries:
  - name: records
    path: /records
    pagination:
      type: link_iteration
      next_url_param:
        location: link_header
        link_relation: next
"#,
    );
    let definition = load_definition_from_str(&yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());
    let fetcher = engine
        .fetcher(&definition.source, definition.query("records").unwrap())
        .await;

    let chunks = fetcher.stream().unwrap().collect_all().await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].value, json!([{"id": 1}]));
    assert_eq!(chunks[1].value, json!([{"id": 2}]));
}

#[tokio::test]
async fn test_cache_round_trip_within_freshness_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = definition(
        &server.uri(),
        r#"  cache_ttl_ms: 60000
queries:
  - name: records
    path: /records
"#,
    );
    let definition = load_definition_from_str(&yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());
    let fetcher = engine
        .fetcher(&definition.source, definition.query("records").unwrap())
        .await;

    let first = fetcher.stream().unwrap().collect_all().await.unwrap();
    let second = fetcher.stream().unwrap().collect_all().await.unwrap();

    assert!(!first[0].from_cache);
    assert!(second[0].from_cache);
    assert_eq!(first[0].value, second[0].value);
    assert_eq!(fetcher.stats().requests, 1);
}

#[tokio::test]
async fn test_stale_cache_entry_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1]})))
        .expect(2)
        .mount(&server)
        .await;

    let yaml = definition(
        &server.uri(),
        r#"  cache_ttl_ms: 1
queries:
  - name: records
    path: /records
"#,
    );
    let definition = load_definition_from_str(&yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());
    let fetcher = engine
        .fetcher(&definition.source, definition.query("records").unwrap())
        .await;

    fetcher.stream().unwrap().collect_all().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    fetcher.stream().unwrap().collect_all().await.unwrap();

    assert_eq!(fetcher.stats().requests, 2);
}

#[tokio::test]
async fn test_max_connections_serializes_concurrent_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let yaml = definition(
        &server.uri(),
        r#"  max_connections: 1
queries:
  - name: a
    path: /a
  - name: b
    path: /b
"#,
    );
    let definition = load_definition_from_str(&yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());

    // Both queries hit the same source, so they share one quota
    let fetcher_a = engine
        .fetcher(&definition.source, definition.query("a").unwrap())
        .await;
    let fetcher_b = engine
        .fetcher(&definition.source, definition.query("b").unwrap())
        .await;

    let start = Instant::now();
    let (a, b) = tokio::join!(
        async { fetcher_a.stream().unwrap().collect_all().await },
        async { fetcher_b.stream().unwrap().collect_all().await },
    );
    a.unwrap();
    b.unwrap();

    // With one connection the two 150ms responses cannot overlap
    assert!(start.elapsed() >= Duration::from_millis(300));
}
