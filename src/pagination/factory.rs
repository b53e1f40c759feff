//! Strategy selection
//!
//! Builds one strategy instance per query execution from the configured
//! pagination spec and the data-source URL shape. An absent or non-HTTP
//! URL always yields the unpaged strategy: there is nothing to iterate
//! against.

use super::strategies::{
    CursorIterationPaginator, GraphqlCursorPaginator, GraphqlPagePaginator,
    LinkIterationPaginator, OffsetPaginator, PageCountPaginator, PageNumberPaginator,
    TotalCountOffsetPaginator, TotalCountPagePaginator, UnpagedPaginator,
};
use super::types::{require_field, require_param, PaginationSpec, Paginator};
use crate::error::Result;
use tracing::debug;

/// Whether a URL can drive an iterated HTTP fetch
fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Build the strategy for a pagination spec and data-source URL.
///
/// Construction validates the spec's required parameters and fails
/// fatally when one is missing; the error names the parameter.
pub fn build_paginator(
    spec: &PaginationSpec,
    base_url: Option<&str>,
) -> Result<Box<dyn Paginator>> {
    match base_url {
        None => {
            debug!("No data source URL, using unpaged strategy");
            return Ok(Box::new(UnpagedPaginator));
        }
        Some(url) if !is_http_url(url) => {
            debug!("Non-HTTP data source URL, using unpaged strategy");
            return Ok(Box::new(UnpagedPaginator));
        }
        Some(_) => {}
    }

    let paginator: Box<dyn Paginator> = match spec {
        PaginationSpec::None => Box::new(UnpagedPaginator),

        PaginationSpec::PageNumber {
            page_param,
            record_count_path,
            first_page_index,
            max_results,
        } => Box::new(PageNumberPaginator::new(
            require_param(page_param, "page parameter")?.clone(),
            require_field(record_count_path, "record count path")?,
            *first_page_index,
            max_results.clone(),
        )?),

        PaginationSpec::PageCount {
            page_param,
            total_pages_param,
            first_page_index,
            max_results,
        } => Box::new(PageCountPaginator::new(
            require_param(page_param, "page parameter")?.clone(),
            require_param(total_pages_param, "total pages parameter")?.clone(),
            *first_page_index,
            max_results.clone(),
        )?),

        PaginationSpec::Offset {
            offset_param,
            record_count_path,
            base_record_length,
            first_index,
        } => Box::new(OffsetPaginator::new(
            require_param(offset_param, "offset parameter")?.clone(),
            require_field(record_count_path, "record count path")?,
            *base_record_length,
            *first_index,
        )?),

        PaginationSpec::TotalCountOffset {
            offset_param,
            total_count_param,
            first_index,
            max_results,
        } => Box::new(TotalCountOffsetPaginator::new(
            require_param(offset_param, "offset parameter")?.clone(),
            require_param(total_count_param, "total count parameter")?.clone(),
            *first_index,
            max_results.clone(),
        )?),

        PaginationSpec::TotalCountPage {
            page_param,
            total_count_param,
            first_page_index,
            max_results,
        } => Box::new(TotalCountPagePaginator::new(
            require_param(page_param, "page parameter")?.clone(),
            require_param(total_count_param, "total count parameter")?.clone(),
            *first_page_index,
            max_results.clone(),
        )?),

        PaginationSpec::LinkIteration { next_url_param } => Box::new(
            LinkIterationPaginator::new(require_param(next_url_param, "next URL parameter")?.clone())?,
        ),

        PaginationSpec::CursorIteration {
            cursor_param,
            cursor_path,
        } => Box::new(CursorIterationPaginator::new(
            require_param(cursor_param, "cursor parameter")?.clone(),
            require_field(cursor_path, "cursor path")?,
        )?),

        PaginationSpec::GraphqlPage {
            page_path,
            record_count_path,
            first_page_index,
            max_results,
        } => Box::new(GraphqlPagePaginator::new(
            require_field(page_path, "page variable path")?,
            require_field(record_count_path, "record count path")?,
            *first_page_index,
            max_results.clone(),
        )?),

        PaginationSpec::GraphqlCursor {
            cursor_write_path,
            cursor_path,
        } => Box::new(GraphqlCursorPaginator::new(
            require_field(cursor_write_path, "cursor variable path")?,
            require_field(cursor_path, "cursor path")?,
        )?),
    };

    debug!("Built '{}' pagination strategy", spec.kind());
    Ok(paginator)
}
