//! Pagination strategies
//!
//! One state machine per server-side pagination contract, behind a
//! single [`Paginator`] interface. A factory selects the strategy from
//! the configured spec and the data-source URL shape; a [`ChunkStream`]
//! drives the strategy as a lazy sequence of chunks with one cached
//! look-ahead fetch.

mod factory;
mod strategies;
mod stream;
mod types;

pub use factory::build_paginator;
pub use strategies::{
    CursorIterationPaginator, GraphqlCursorPaginator, GraphqlPagePaginator,
    LinkIterationPaginator, OffsetPaginator, PageCountPaginator, PageNumberPaginator,
    TotalCountOffsetPaginator, TotalCountPagePaginator, UnpagedPaginator,
};
pub use stream::{Chunk, ChunkStream, PageFetcher};
pub use types::{
    parse_link_header, read_control, read_count_at_path, read_numeric_control, IterationState,
    MaxResultsSpec, NextPage, PageRequest, Paginator, ParamLocation, ParameterDescriptor,
    PaginationSpec,
};

#[cfg(test)]
mod tests;
