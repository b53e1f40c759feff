//! Immutable request descriptors
//!
//! A [`RequestDescriptor`] describes exactly one HTTP call: method, URL,
//! query parameters, headers, and optional JSON body. It is built once
//! per fetch attempt and discarded after use. The cache fingerprint is
//! derived at construction so identical requests always map to the same
//! cache key.

use crate::types::{JsonValue, Method};
use sha2::{Digest, Sha256};

/// Immutable value describing one HTTP call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<JsonValue>,
    fingerprint: String,
}

impl RequestDescriptor {
    /// Build a descriptor from its parts.
    ///
    /// Query parameters are sorted by key so parameter order never
    /// affects the fingerprint.
    pub fn new(
        method: Method,
        url: impl Into<String>,
        mut query: Vec<(String, String)>,
        headers: Vec<(String, String)>,
        body: Option<JsonValue>,
    ) -> Self {
        let url = url.into();
        query.sort();

        let fingerprint = compute_fingerprint(method, &url, &query, body.as_ref());

        Self {
            method,
            url,
            query,
            headers,
            body,
            fingerprint,
        }
    }

    /// Build a GET descriptor with no parameters
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, Vec::new(), Vec::new(), None)
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target URL (without query string)
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters, sorted by key
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request headers
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Optional JSON body
    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }

    /// Stable cache fingerprint for this request.
    ///
    /// A function of method, URL, sorted query parameters, and body.
    /// Headers are deliberately excluded so auth rotation does not
    /// invalidate cached pages.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// SHA-256 over the canonical request form, hex-encoded (file-safe)
fn compute_fingerprint(
    method: Method,
    url: &str,
    query: &[(String, String)],
    body: Option<&JsonValue>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(url.as_bytes());
    for (key, value) in query {
        hasher.update([0]);
        hasher.update(key.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.as_bytes());
    }
    if let Some(body) = body {
        hasher.update([0]);
        hasher.update(body.to_string().as_bytes());
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
