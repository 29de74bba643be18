//! Limit/offset pagination
//!
//! Every list endpoint accepts `limit` and `offset` query parameters and
//! answers with `{count, next, previous, results}`. The links keep the
//! request's other query parameters.

use axum::http::Uri;
use serde::Deserialize;
use yamdb_common::api::types::PageResponse;
use yamdb_common::db::Page;

/// Upper bound on `limit` regardless of what the client asks for
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    /// Requested limit, or `default` when absent or non-positive
    pub fn limit(&self, default: i64) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
            .min(MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Wrap a store page into the response envelope, converting each item
pub fn page_response<T, U>(page: Page<T>, uri: &Uri, limit: i64, offset: i64) -> PageResponse<U>
where
    U: From<T>,
{
    let next_offset = offset.saturating_add(limit);
    let next = (next_offset < page.count).then(|| page_link(uri, limit, next_offset));
    let previous = (offset > 0).then(|| page_link(uri, limit, offset.saturating_sub(limit).max(0)));

    PageResponse {
        count: page.count,
        next,
        previous,
        results: page.items.into_iter().map(U::from).collect(),
    }
}

fn page_link(uri: &Uri, limit: i64, offset: i64) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !pair.starts_with("limit=") && !pair.starts_with("offset="))
        .map(str::to_string)
        .collect();
    pairs.push(format!("limit={}", limit));
    pairs.push(format!("offset={}", offset));

    format!("{}?{}", uri.path(), pairs.join("&"))
}
