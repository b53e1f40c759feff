//! Response transformer
//!
//! Parses raw response bodies into generic JSON values and extracts
//! pagination control fields by path. Path absence is a first-class
//! outcome ([`Lookup::NotFound`]), never an error: many real APIs omit
//! count/cursor fields entirely on empty results, and strategies treat
//! that as "no more data".

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;


/// Outcome of a path lookup against a parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The path resolved to a value
    Found(JsonValue),
    /// The path does not exist in the body
    NotFound,
}

impl Lookup {
    /// Get the value if found
    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    /// Consume into an optional value
    pub fn into_value(self) -> Option<JsonValue> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    /// Check if the path resolved
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Render the found value as a string, if it is a scalar
    pub fn as_scalar_string(&self) -> Option<String> {
        match self {
            Lookup::Found(Value::String(s)) => Some(s.clone()),
            Lookup::Found(Value::Number(n)) => Some(n.to_string()),
            Lookup::Found(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Strip malformed prefixes from a raw body.
///
/// Removes a UTF-8 BOM, leading whitespace, and any garbage bytes before
/// the first `{` or `[` (some servers prepend XSSI guards like `)]}'`).
/// Bodies that contain no JSON opener at all are returned trimmed, so
/// bare scalars still parse.
pub fn sanitize_body(raw: &[u8]) -> &[u8] {
    let body = raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw);

    match body.iter().position(|b| *b == b'{' || *b == b'[') {
        Some(pos) => &body[pos..],
        None => body,
    }
}

/// Parse a raw response body into a JSON value.
///
/// The body is sanitized first. An empty or whitespace-only body parses
/// to `Null` rather than erroring; strategies interpret `Null` as an
/// absent body.
pub fn parse_body(raw: &[u8]) -> Result<JsonValue> {
    let body = sanitize_body(raw);
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body).map_err(Error::JsonParse)
}

/// Look up a dot-notation path in a parsed body.
///
/// Supports `$.`-prefixed paths, object keys, and array indexing in both
/// `items[0]` and bare-numeric `items.0` forms. Wildcard patterns are
/// delegated to jsonpath-rust.
pub fn lookup(value: &JsonValue, path: &str) -> Lookup {
    if path.is_empty() {
        return Lookup::Found(value.clone());
    }

    if path.contains('*') {
        return lookup_jsonpath(value, path);
    }

    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut current = value;

    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            // Array indexing like "data[0]" or "items[-1]"
            let name = &part[..bracket_pos];
            let index_str = &part[bracket_pos + 1..part.len().saturating_sub(1)];

            if !name.is_empty() {
                match current.get(name) {
                    Some(v) => current = v,
                    None => return Lookup::NotFound,
                }
            }

            let Ok(index) = index_str.parse::<i64>() else {
                return Lookup::NotFound;
            };
            let Value::Array(arr) = current else {
                return Lookup::NotFound;
            };
            let idx = if index < 0 {
                (arr.len() as i64 + index) as usize
            } else {
                index as usize
            };
            match arr.get(idx) {
                Some(v) => current = v,
                None => return Lookup::NotFound,
            }
        } else if let Ok(index) = part.parse::<usize>() {
            // Bare numeric segment indexes into an array
            match current {
                Value::Array(arr) => match arr.get(index) {
                    Some(v) => current = v,
                    None => return Lookup::NotFound,
                },
                Value::Object(map) => match map.get(part) {
                    Some(v) => current = v,
                    None => return Lookup::NotFound,
                },
                _ => return Lookup::NotFound,
            }
        } else {
            match current.get(part) {
                Some(v) => current = v,
                None => return Lookup::NotFound,
            }
        }
    }

    Lookup::Found(current.clone())
}

/// Wildcard path lookup via jsonpath-rust
fn lookup_jsonpath(value: &JsonValue, path: &str) -> Lookup {
    use jsonpath_rust::JsonPath;

    let Ok(jp) = JsonPath::try_from(path) else {
        return Lookup::NotFound;
    };

    match jp.find(value) {
        Value::Null => Lookup::NotFound,
        Value::Array(arr) if arr.is_empty() => Lookup::NotFound,
        found => Lookup::Found(found),
    }
}

/// Read a record count from a pagination control value.
///
/// Accepts a bare number, a numeric string, or a one-element array
/// containing either. Anything else is `None`, meaning "zero/unknown",
/// never an error.
pub fn record_count(value: &JsonValue) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            // Some APIs report counts as floats
            n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Array(arr) if arr.len() == 1 => record_count(&arr[0]),
        _ => None,
    }
}

/// Count the records carried by a response body, for empty-page checks.
///
/// An array counts its elements; `Null` counts zero; any other value is
/// a single record.
pub fn body_record_count(value: &JsonValue) -> usize {
    match value {
        Value::Array(arr) => arr.len(),
        Value::Null => 0,
        _ => 1,
    }
}

/// Debug helper that persists raw response bodies to temp files.
///
/// Enabled by the engine's `dump_bodies` flag; files land under the
/// system temp directory and are never read back by the engine.
#[derive(Debug, Clone)]
pub struct BodyDumper {
    dir: PathBuf,
    enabled: bool,
}

impl BodyDumper {
    /// Create a dumper writing under the given directory
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    /// Create a disabled dumper
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    /// Whether dumping is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Persist one raw body, named after the request fingerprint.
    ///
    /// Dump failures are logged and swallowed; inspection output must
    /// never fail a fetch.
    pub fn dump(&self, fingerprint: &str, raw: &[u8]) {
        if !self.enabled {
            return;
        }

        let path = self.dir.join(format!("response-{fingerprint}.json"));
        let result = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::File::create(&path))
            .and_then(|mut f| f.write_all(raw));

        match result {
            Ok(()) => debug!("Dumped response body to {}", path.display()),
            Err(e) => debug!("Failed to dump response body: {e}"),
        }
    }
}
