//! Cache entry type
//!
//! A serializable snapshot of a response envelope. Entries are created
//! on first successful fetch, read-shared afterwards, and never mutated
//! in place.

use crate::error::{Error, Result};
use crate::http::ResponseEnvelope;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Serializable snapshot of a response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// HTTP status code (always 200 for stored entries)
    pub status: u16,
    /// Response header pairs
    pub headers: Vec<(String, String)>,
    /// Body bytes, base64-encoded for the JSON disk format
    pub body: String,
    /// When the entry was stored
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Snapshot a response envelope
    pub fn from_envelope(envelope: &ResponseEnvelope) -> Self {
        let headers = envelope
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: envelope.status,
            headers,
            body: BASE64.encode(&envelope.body),
            stored_at: Utc::now(),
        }
    }

    /// Reconstruct a response envelope from this snapshot
    pub fn to_envelope(&self) -> Result<ResponseEnvelope> {
        let body = BASE64
            .decode(&self.body)
            .map_err(|e| Error::cache(format!("Corrupt cached body: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<HeaderName>(),
                value.parse::<HeaderValue>(),
            ) {
                headers.insert(name, value);
            }
        }

        Ok(ResponseEnvelope::new(self.status, headers, Bytes::from(body)))
    }

    /// Age of this entry right now
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.stored_at
    }

    /// Whether the entry is still inside the freshness window
    pub fn is_fresh(&self, max_age_ms: u64) -> bool {
        self.age().num_milliseconds() >= 0
            && (self.age().num_milliseconds() as u64) < max_age_ms
    }
}
