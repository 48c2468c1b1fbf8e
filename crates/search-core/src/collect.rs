//! Cursor-following paginated ID collection.
//!
//! Repeatedly calls a caller-supplied page fetcher, deduplicates ids across
//! pages, and stops on exhaustion, an iteration ceiling, or a configured
//! collection cap.

use std::collections::HashSet;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::SearchError;

/// Page size requested from every paginated source.
pub const PAGE_SIZE: usize = 250;

/// Iteration ceiling: liveness valve against a source that never reports
/// exhaustion. Reaching it returns partial results with a warning.
pub const MAX_PAGINATION_ITERATIONS: usize = 1000;

/// One page from an opaque, offset-paginated ID source.
///
/// `total_count`, when present, is the authoritative exhaustion signal;
/// otherwise exhaustion is inferred from an empty page.
#[derive(Debug, Clone, Default)]
pub struct IdPage {
    pub ids: Vec<String>,
    pub item_count: usize,
    pub total_count: Option<usize>,
}

/// Options for a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Cooperative cancellation; checked before every page fetch.
    pub cancel: Option<CancellationToken>,
    /// Hard cap on collected ids; exceeding it is an error, unlike the
    /// iteration ceiling.
    pub max_ids: Option<usize>,
    /// Label naming the source in logs and cap errors.
    pub source: String,
}

impl CollectOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_ids(mut self, max_ids: Option<usize>) -> Self {
        self.max_ids = max_ids;
        self
    }
}

/// Collect the complete deduplicated ID set from a paginated source.
///
/// Ids are trimmed, blanks dropped, and duplicates across pages removed
/// while preserving first-seen order. The offset advances by each page's
/// `item_count`, so sources that report raw row counts (one row per
/// variant, several rows per product) paginate correctly even though the
/// deduplicated output is shorter.
pub async fn collect_ids<F, Fut>(
    mut fetch_page: F,
    opts: CollectOptions,
) -> Result<Vec<String>, SearchError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<IdPage, SearchError>>,
{
    let mut offset = 0usize;
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for _ in 0..MAX_PAGINATION_ITERATIONS {
        if let Some(token) = &opts.cancel {
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
        }

        let page = fetch_page(offset, PAGE_SIZE).await?;

        for raw in &page.ids {
            let id = raw.trim();
            if id.is_empty() || seen.contains(id) {
                continue;
            }
            seen.insert(id.to_owned());
            out.push(id.to_owned());
        }

        if let Some(max) = opts.max_ids {
            if out.len() > max {
                return Err(SearchError::CollectionLimitExceeded {
                    limit: max,
                    source: opts.source.clone(),
                });
            }
        }

        if page.item_count == 0 {
            return Ok(out);
        }
        offset += page.item_count;
        if let Some(total) = page.total_count {
            if offset >= total {
                return Ok(out);
            }
        }
    }

    warn!(
        source = %opts.source,
        iterations = MAX_PAGINATION_ITERATIONS,
        collected = out.len(),
        "pagination ceiling reached, returning partial ids"
    );
    Ok(out)
}
