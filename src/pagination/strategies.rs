//! Pagination strategy implementations
//!
//! One state machine per server-side pagination contract. Each strategy
//! validates its required parameters at construction and encodes its
//! own termination rule; data absence in a response always terminates
//! cleanly, while a cursor that fails to advance is a fatal error.

use super::types::{
    read_count_at_path, read_control, read_numeric_control, IterationState, MaxResultsSpec,
    NextPage, PageRequest, Paginator, ParamLocation, ParameterDescriptor,
};
use crate::error::{Error, Result};
use crate::transform::{body_record_count, lookup};
use crate::types::JsonValue;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

// ============================================================================
// Unpaged
// ============================================================================

/// Single request, no pagination.
///
/// Always completes after the first fetch regardless of result.
#[derive(Debug, Clone, Default)]
pub struct UnpagedPaginator;

impl Paginator for UnpagedPaginator {
    fn initial_request(&self, _state: &IterationState) -> PageRequest {
        PageRequest::new()
    }

    fn process_response(
        &self,
        body: &JsonValue,
        _headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        state.add_fetched(body_record_count(body) as u64);
        state.mark_done();
        Ok(NextPage::Complete)
    }
}

// ============================================================================
// Page Number
// ============================================================================

/// Incrementing page counter.
///
/// Writes the counter into the configured parameter starting at the
/// first-page index; terminates when the record-count path reads zero
/// (scalar or one-element array) or the body is absent.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    page_param: ParameterDescriptor,
    record_count_path: String,
    first_page_index: u64,
    max_results: Option<MaxResultsSpec>,
}

impl PageNumberPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        page_param: ParameterDescriptor,
        record_count_path: impl Into<String>,
        first_page_index: u64,
        max_results: Option<MaxResultsSpec>,
    ) -> Result<Self> {
        page_param.validate_writable("page parameter")?;
        let record_count_path = record_count_path.into();
        if record_count_path.is_empty() {
            return Err(Error::missing_parameter("record count path"));
        }
        Ok(Self {
            page_param,
            record_count_path,
            first_page_index,
            max_results,
        })
    }

    fn page_request(&self, page: u64) -> PageRequest {
        let mut request = PageRequest::new();
        request.write(&self.page_param, page.to_string());
        if let Some(max) = &self.max_results {
            max.inject(&mut request);
        }
        request
    }
}

impl Paginator for PageNumberPaginator {
    fn init_state(&self, state: &mut IterationState) {
        state.page = self.first_page_index;
    }

    fn initial_request(&self, state: &IterationState) -> PageRequest {
        self.page_request(state.page)
    }

    fn process_response(
        &self,
        body: &JsonValue,
        _headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        if body.is_null() {
            state.mark_done();
            return Ok(NextPage::Discard);
        }

        let count = read_count_at_path(body, &self.record_count_path).unwrap_or(0);
        if count == 0 {
            debug!("Page {} reported zero records, stopping", state.page);
            state.mark_done();
            return Ok(NextPage::Discard);
        }

        state.add_fetched(count);
        state.page += 1;
        Ok(NextPage::Continue(self.page_request(state.page)))
    }
}

// ============================================================================
// Page Count
// ============================================================================

/// Total page count discovered up front.
///
/// The first request is unparameterized and exists only to read the
/// total page count; its response is discarded. Pages are then fetched
/// explicitly until `page >= total + first_page_index`. An unparseable
/// total means "no more pages" after the one discovery page, not an
/// error.
#[derive(Debug, Clone)]
pub struct PageCountPaginator {
    page_param: ParameterDescriptor,
    total_pages_param: ParameterDescriptor,
    first_page_index: u64,
    max_results: Option<MaxResultsSpec>,
}

impl PageCountPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        page_param: ParameterDescriptor,
        total_pages_param: ParameterDescriptor,
        first_page_index: u64,
        max_results: Option<MaxResultsSpec>,
    ) -> Result<Self> {
        page_param.validate_writable("page parameter")?;
        if total_pages_param.location == ParamLocation::Query {
            return Err(Error::InvalidConfigValue {
                field: "total pages parameter".to_string(),
                message: "cannot be read from a query parameter".to_string(),
            });
        }
        Ok(Self {
            page_param,
            total_pages_param,
            first_page_index,
            max_results,
        })
    }

    fn page_request(&self, page: u64) -> PageRequest {
        let mut request = PageRequest::new();
        request.write(&self.page_param, page.to_string());
        if let Some(max) = &self.max_results {
            max.inject(&mut request);
        }
        request
    }
}

impl Paginator for PageCountPaginator {
    fn initial_request(&self, _state: &IterationState) -> PageRequest {
        // Discovery request carries no page parameter
        let mut request = PageRequest::new();
        if let Some(max) = &self.max_results {
            max.inject(&mut request);
        }
        request
    }

    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        let Some(total) = state.total else {
            // Discovery step
            return match read_numeric_control(&self.total_pages_param, body, headers) {
                Some(0) => {
                    state.mark_done();
                    Ok(NextPage::Discard)
                }
                Some(total) => {
                    debug!("Discovered {total} total pages");
                    state.total = Some(total);
                    state.page = self.first_page_index;
                    Ok(NextPage::Skip(self.page_request(state.page)))
                }
                None => {
                    // Unparseable total: the one page we have is all
                    // there is
                    state.mark_done();
                    Ok(NextPage::Complete)
                }
            };
        };

        state.add_fetched(body_record_count(body) as u64);

        let next = state.page + 1;
        if next >= total + self.first_page_index {
            state.mark_done();
            return Ok(NextPage::Complete);
        }

        state.page = next;
        Ok(NextPage::Continue(self.page_request(next)))
    }
}

// ============================================================================
// Offset
// ============================================================================

/// Running offset advanced by the observed record count.
///
/// Self-correcting: the offset advances by what the server actually
/// returned, not by a fixed page size. Terminates when the reported
/// count does not exceed the configured base record length.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    offset_param: ParameterDescriptor,
    record_count_path: String,
    base_record_length: u64,
    first_index: u64,
}

impl OffsetPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        offset_param: ParameterDescriptor,
        record_count_path: impl Into<String>,
        base_record_length: u64,
        first_index: u64,
    ) -> Result<Self> {
        offset_param.validate_writable("offset parameter")?;
        let record_count_path = record_count_path.into();
        if record_count_path.is_empty() {
            return Err(Error::missing_parameter("record count path"));
        }
        Ok(Self {
            offset_param,
            record_count_path,
            base_record_length,
            first_index,
        })
    }

    fn offset_request(&self, offset: u64) -> PageRequest {
        let mut request = PageRequest::new();
        request.write(&self.offset_param, offset.to_string());
        request
    }
}

impl Paginator for OffsetPaginator {
    fn init_state(&self, state: &mut IterationState) {
        state.offset = self.first_index;
    }

    fn initial_request(&self, state: &IterationState) -> PageRequest {
        self.offset_request(state.offset)
    }

    fn process_response(
        &self,
        body: &JsonValue,
        _headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        let count = read_count_at_path(body, &self.record_count_path).unwrap_or(0);
        state.add_fetched(count);

        if count <= self.base_record_length {
            debug!(
                "Count {count} at or below base record length {}, stopping",
                self.base_record_length
            );
            state.mark_done();
            return Ok(NextPage::Complete);
        }

        state.offset += count;
        Ok(NextPage::Continue(self.offset_request(state.offset)))
    }
}

// ============================================================================
// Total Count + Offset
// ============================================================================

/// Total record count discovered once, offset advanced by a fixed page
/// size.
///
/// Accounting is done in units of `max_results`, which is why the
/// parameter is auto-injected when write-enabled: a mismatch between
/// the accounted and the server-observed page size would skip or repeat
/// records.
#[derive(Debug, Clone)]
pub struct TotalCountOffsetPaginator {
    offset_param: ParameterDescriptor,
    total_count_param: ParameterDescriptor,
    first_index: u64,
    max_results: MaxResultsSpec,
}

impl TotalCountOffsetPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        offset_param: ParameterDescriptor,
        total_count_param: ParameterDescriptor,
        first_index: u64,
        max_results: Option<MaxResultsSpec>,
    ) -> Result<Self> {
        offset_param.validate_writable("offset parameter")?;
        let max_results = max_results.ok_or_else(|| Error::missing_parameter("max results"))?;
        if max_results.value == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max results".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            offset_param,
            total_count_param,
            first_index,
            max_results,
        })
    }

    fn offset_request(&self, offset: u64) -> PageRequest {
        let mut request = PageRequest::new();
        request.write(&self.offset_param, offset.to_string());
        self.max_results.inject(&mut request);
        request
    }
}

impl Paginator for TotalCountOffsetPaginator {
    fn init_state(&self, state: &mut IterationState) {
        state.offset = self.first_index;
    }

    fn initial_request(&self, state: &IterationState) -> PageRequest {
        self.offset_request(state.offset)
    }

    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        if state.total.is_none() {
            let total = read_numeric_control(&self.total_count_param, body, headers).unwrap_or(0);
            debug!("Discovered {total} total records");
            state.total = Some(total);
        }
        let total = state.total.unwrap_or(0);

        state.add_fetched(self.max_results.value);
        if state.fetched >= total {
            state.mark_done();
            return Ok(NextPage::Complete);
        }

        state.offset += self.max_results.value;
        Ok(NextPage::Continue(self.offset_request(state.offset)))
    }
}

// ============================================================================
// Total Count + Page
// ============================================================================

/// Total record count discovered once, last page computed from it.
///
/// `last_page = first_page_index + ceil(total / max_results) - 1`;
/// terminates when the next page number would exceed it.
#[derive(Debug, Clone)]
pub struct TotalCountPagePaginator {
    page_param: ParameterDescriptor,
    total_count_param: ParameterDescriptor,
    first_page_index: u64,
    max_results: MaxResultsSpec,
}

impl TotalCountPagePaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        page_param: ParameterDescriptor,
        total_count_param: ParameterDescriptor,
        first_page_index: u64,
        max_results: Option<MaxResultsSpec>,
    ) -> Result<Self> {
        page_param.validate_writable("page parameter")?;
        let max_results = max_results.ok_or_else(|| Error::missing_parameter("max results"))?;
        if max_results.value == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max results".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            page_param,
            total_count_param,
            first_page_index,
            max_results,
        })
    }

    fn page_request(&self, page: u64) -> PageRequest {
        let mut request = PageRequest::new();
        request.write(&self.page_param, page.to_string());
        self.max_results.inject(&mut request);
        request
    }

    fn last_page(&self, total: u64) -> u64 {
        let pages = total.div_ceil(self.max_results.value);
        self.first_page_index + pages.saturating_sub(1)
    }
}

impl Paginator for TotalCountPagePaginator {
    fn init_state(&self, state: &mut IterationState) {
        state.page = self.first_page_index;
    }

    fn initial_request(&self, state: &IterationState) -> PageRequest {
        self.page_request(state.page)
    }

    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        if state.total.is_none() {
            match read_numeric_control(&self.total_count_param, body, headers) {
                Some(total) => {
                    debug!("Discovered {total} total records");
                    state.total = Some(total);
                }
                None => {
                    // Unknown total: this page is all we can account for
                    state.mark_done();
                    return Ok(NextPage::Complete);
                }
            }
        }
        let total = state.total.unwrap_or(0);

        state.add_fetched(body_record_count(body) as u64);

        let next = state.page + 1;
        if total == 0 || next > self.last_page(total) {
            state.mark_done();
            return Ok(NextPage::Complete);
        }

        state.page = next;
        Ok(NextPage::Continue(self.page_request(next)))
    }
}

// ============================================================================
// Link Iteration
// ============================================================================

/// Next-page URL taken from the prior response.
///
/// The URL may live at a JSON path in the body, in a plain header, or
/// in an RFC 5988 `Link` header selected by relation name. Terminates
/// when no URL is extractable or the response is an explicitly empty
/// list.
#[derive(Debug, Clone)]
pub struct LinkIterationPaginator {
    next_url_param: ParameterDescriptor,
}

impl LinkIterationPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(next_url_param: ParameterDescriptor) -> Result<Self> {
        if next_url_param.location == ParamLocation::Query {
            return Err(Error::InvalidConfigValue {
                field: "next URL parameter".to_string(),
                message: "cannot be read from a query parameter".to_string(),
            });
        }
        if next_url_param.location != ParamLocation::LinkHeader && next_url_param.value.is_empty() {
            return Err(Error::missing_parameter("next URL parameter"));
        }
        Ok(Self { next_url_param })
    }
}

impl Paginator for LinkIterationPaginator {
    fn initial_request(&self, _state: &IterationState) -> PageRequest {
        PageRequest::new()
    }

    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        if matches!(body, Value::Array(arr) if arr.is_empty()) {
            state.mark_done();
            return Ok(NextPage::Discard);
        }

        state.add_fetched(body_record_count(body) as u64);

        let next_url = read_control(&self.next_url_param, body, headers)
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            });

        match next_url {
            Some(url) => {
                state.page += 1;
                Ok(NextPage::Continue(PageRequest::with_url(url)))
            }
            None => {
                state.mark_done();
                Ok(NextPage::Complete)
            }
        }
    }
}

// ============================================================================
// Cursor Iteration (max_id-style)
// ============================================================================

/// Vendor cursor iteration.
///
/// Extracts an opaque offset token from each response and decrements it
/// before reissuing (the max_id convention). A cursor that repeats its
/// previous value raises a fatal non-progress error so a misbehaving
/// API cannot cause an infinite request loop.
#[derive(Debug, Clone)]
pub struct CursorIterationPaginator {
    cursor_param: ParameterDescriptor,
    cursor_path: String,
}

impl CursorIterationPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(cursor_param: ParameterDescriptor, cursor_path: impl Into<String>) -> Result<Self> {
        cursor_param.validate_writable("cursor parameter")?;
        let cursor_path = cursor_path.into();
        if cursor_path.is_empty() {
            return Err(Error::missing_parameter("cursor path"));
        }
        Ok(Self {
            cursor_param,
            cursor_path,
        })
    }

    /// Apply the vendor transform to an extracted cursor
    fn next_cursor_value(cursor: &str) -> String {
        match cursor.parse::<i64>() {
            Ok(n) => (n - 1).to_string(),
            Err(_) => cursor.to_string(),
        }
    }
}

impl Paginator for CursorIterationPaginator {
    fn initial_request(&self, _state: &IterationState) -> PageRequest {
        PageRequest::new()
    }

    fn process_response(
        &self,
        body: &JsonValue,
        _headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        state.add_fetched(body_record_count(body) as u64);

        let cursor = lookup(body, &self.cursor_path).as_scalar_string();
        let Some(cursor) = cursor else {
            state.mark_done();
            return Ok(NextPage::Complete);
        };

        if state.cursor.as_deref() == Some(cursor.as_str()) {
            return Err(Error::no_progress(cursor));
        }

        state.advance_cursor(cursor.clone());

        let mut request = PageRequest::new();
        request.write(&self.cursor_param, Self::next_cursor_value(&cursor));
        Ok(NextPage::Continue(request))
    }
}

// ============================================================================
// GraphQL Page Number
// ============================================================================

/// Page-number progress with the counter merged into GraphQL variables.
///
/// Same termination rule as [`PageNumberPaginator`]; the page value is
/// merged into the existing `variables` JSON object rather than
/// overwriting it.
#[derive(Debug, Clone)]
pub struct GraphqlPagePaginator {
    inner: PageNumberPaginator,
}

impl GraphqlPagePaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        page_path: impl Into<String>,
        record_count_path: impl Into<String>,
        first_page_index: u64,
        max_results: Option<MaxResultsSpec>,
    ) -> Result<Self> {
        let page_path = page_path.into();
        if page_path.is_empty() {
            return Err(Error::missing_parameter("page variable path"));
        }
        Ok(Self {
            inner: PageNumberPaginator::new(
                ParameterDescriptor::json_path(page_path),
                record_count_path,
                first_page_index,
                max_results,
            )?,
        })
    }
}

impl Paginator for GraphqlPagePaginator {
    fn init_state(&self, state: &mut IterationState) {
        self.inner.init_state(state);
    }

    fn initial_request(&self, state: &IterationState) -> PageRequest {
        self.inner.initial_request(state)
    }

    fn process_response(
        &self,
        body: &JsonValue,
        headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        self.inner.process_response(body, headers, state)
    }
}

// ============================================================================
// GraphQL Cursor
// ============================================================================

/// Cursor progress with the token merged into GraphQL variables.
///
/// Link-style termination: when no cursor is extractable from the
/// response, iteration completes.
#[derive(Debug, Clone)]
pub struct GraphqlCursorPaginator {
    cursor_write_path: String,
    cursor_path: String,
}

impl GraphqlCursorPaginator {
    /// Create the strategy, validating required parameters
    pub fn new(
        cursor_write_path: impl Into<String>,
        cursor_path: impl Into<String>,
    ) -> Result<Self> {
        let cursor_write_path = cursor_write_path.into();
        if cursor_write_path.is_empty() {
            return Err(Error::missing_parameter("cursor variable path"));
        }
        let cursor_path = cursor_path.into();
        if cursor_path.is_empty() {
            return Err(Error::missing_parameter("cursor path"));
        }
        Ok(Self {
            cursor_write_path,
            cursor_path,
        })
    }
}

impl Paginator for GraphqlCursorPaginator {
    fn initial_request(&self, _state: &IterationState) -> PageRequest {
        PageRequest::new()
    }

    fn process_response(
        &self,
        body: &JsonValue,
        _headers: &HeaderMap,
        state: &mut IterationState,
    ) -> Result<NextPage> {
        state.add_fetched(body_record_count(body) as u64);

        let cursor = lookup(body, &self.cursor_path)
            .as_scalar_string()
            .filter(|c| !c.is_empty());

        match cursor {
            Some(cursor) => {
                state.advance_cursor(cursor.clone());
                let mut request = PageRequest::new();
                request.body_merges.push((
                    self.cursor_write_path.clone(),
                    Value::String(cursor),
                ));
                Ok(NextPage::Continue(request))
            }
            None => {
                state.mark_done();
                Ok(NextPage::Complete)
            }
        }
    }
}
