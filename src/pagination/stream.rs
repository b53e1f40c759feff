//! Look-ahead chunk iteration
//!
//! Drives one paginator against a fetcher as a lazy sequence of parsed
//! chunks. One look-ahead chunk is cached so `has_next` and `try_next`
//! are side-effect-consistent: repeated `has_next` calls never issue a
//! second request.

use super::types::{IterationState, NextPage, PageRequest, Paginator};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use futures::Stream;
use reqwest::header::HeaderMap;
use tracing::debug;

/// One parsed page of results
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Parsed response body
    pub value: JsonValue,
    /// HTTP status of the producing response
    pub status: u16,
    /// Response headers (also populated for cached responses, from the
    /// cached snapshot)
    pub headers: HeaderMap,
    /// Whether the body came from the response cache
    pub from_cache: bool,
}

/// Executes one page request and produces a chunk.
///
/// Implemented by the fetch engine; strategies and streams never talk
/// to the transport directly, which keeps them testable with scripted
/// fetchers.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page a request describes
    async fn fetch(&self, request: &PageRequest) -> Result<Chunk>;
}

/// Lazy sequence of chunks for one query execution.
///
/// The stream owns its strategy instance and iteration state; both are
/// destroyed when the stream is dropped. Chunks already yielded remain
/// valid when a later fetch fails.
pub struct ChunkStream<'a> {
    fetcher: &'a dyn PageFetcher,
    paginator: Box<dyn Paginator>,
    state: IterationState,
    lookahead: Option<Chunk>,
    pending_error: Option<Error>,
    next_request: Option<PageRequest>,
    started: bool,
}

impl<'a> ChunkStream<'a> {
    /// Create a stream over a fetcher and strategy
    pub fn new(fetcher: &'a dyn PageFetcher, paginator: Box<dyn Paginator>) -> Self {
        let mut state = IterationState::new();
        paginator.init_state(&mut state);
        Self {
            fetcher,
            paginator,
            state,
            lookahead: None,
            pending_error: None,
            next_request: None,
            started: false,
        }
    }

    /// Whether another chunk is available.
    ///
    /// Fills the look-ahead slot if necessary; calling this repeatedly
    /// without an intervening [`try_next`](Self::try_next) issues no
    /// additional requests. A pending fatal error (a cursor that failed
    /// to advance) surfaces here.
    pub async fn has_next(&mut self) -> Result<bool> {
        self.fill_lookahead().await?;
        if self.lookahead.is_some() {
            return Ok(true);
        }
        if let Some(error) = self.pending_error.take() {
            return Err(error);
        }
        Ok(false)
    }

    /// Produce the next chunk, or `None` when iteration is complete.
    pub async fn try_next(&mut self) -> Result<Option<Chunk>> {
        self.fill_lookahead().await?;
        if let Some(chunk) = self.lookahead.take() {
            return Ok(Some(chunk));
        }
        if let Some(error) = self.pending_error.take() {
            return Err(error);
        }
        Ok(None)
    }

    /// Collect every remaining chunk (mainly for tests and the CLI)
    pub async fn collect_all(&mut self) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.try_next().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Iteration state snapshot
    pub fn state(&self) -> &IterationState {
        &self.state
    }

    /// Adapt into a [`futures::Stream`] of chunks.
    ///
    /// A fatal error is yielded as the final item; the stream then
    /// terminates.
    pub fn into_stream(self) -> impl Stream<Item = Result<Chunk>> + 'a {
        futures::stream::unfold(self, |mut stream| async move {
            match stream.try_next().await {
                Ok(Some(chunk)) => Some((Ok(chunk), stream)),
                Ok(None) => None,
                Err(error) => Some((Err(error), stream)),
            }
        })
    }

    async fn fill_lookahead(&mut self) -> Result<()> {
        // Discovery responses are skipped, so looping until a yieldable
        // chunk or termination
        loop {
            if self.lookahead.is_some() || self.pending_error.is_some() || self.state.done {
                return Ok(());
            }

            let request = match self.next_request.take() {
                Some(request) => request,
                None if !self.started => self.paginator.initial_request(&self.state),
                None => {
                    self.state.mark_done();
                    return Ok(());
                }
            };
            self.started = true;

            // Transport errors propagate immediately; chunks already
            // yielded stay valid for the caller
            let chunk = self.fetcher.fetch(&request).await?;
            self.state.responses_seen += 1;

            match self
                .paginator
                .process_response(&chunk.value, &chunk.headers, &mut self.state)
            {
                Ok(NextPage::Continue(next)) => {
                    self.next_request = Some(next);
                    self.lookahead = Some(chunk);
                    return Ok(());
                }
                Ok(NextPage::Skip(next)) => {
                    debug!("Discarding discovery response");
                    self.next_request = Some(next);
                }
                Ok(NextPage::Complete) => {
                    self.state.mark_done();
                    self.lookahead = Some(chunk);
                    return Ok(());
                }
                Ok(NextPage::Discard) => {
                    self.state.mark_done();
                    return Ok(());
                }
                Err(error) => {
                    // The response itself is valid data; yield it and
                    // raise the fatal error on the next attempt
                    self.state.mark_done();
                    self.lookahead = Some(chunk);
                    self.pending_error = Some(error);
                    return Ok(());
                }
            }
        }
    }
}

impl std::fmt::Debug for ChunkStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("state", &self.state)
            .field("has_lookahead", &self.lookahead.is_some())
            .finish_non_exhaustive()
    }
}
