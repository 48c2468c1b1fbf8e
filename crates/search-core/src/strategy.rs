//! Retrieval strategy selection.
//!
//! Maps the shape of a search request (free-text query, category filter,
//! size filter, sort order) to the retrieval path that serves it. Pure and
//! deterministic; the orchestrator dispatches on the returned variant.

use serde::{Deserialize, Serialize};

use crate::ids::dedupe_ids;

/// Canonical "newest" sort value.
pub const SORT_NEWEST: &str = "newest";
/// Backend alias for the newest sort.
pub const SORT_CREATED_AT_DESC: &str = "-created_at";

/// The retrieval path chosen for a search request.
///
/// Each variant carries exactly the parameters its fetcher needs, so the
/// dispatch match stays exhaustive: adding a strategy without a handler is
/// a compile error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Full-text hits intersected with both category and size ID sets.
    FullTextCategorySize {
        query: String,
        categories: Vec<String>,
        sizes: Vec<String>,
    },
    /// Full-text hits intersected with a category-scoped ID set.
    FullTextCategory {
        query: String,
        categories: Vec<String>,
    },
    /// Full-text hits intersected with a variant-size ID set.
    FullTextSize { query: String, sizes: Vec<String> },
    /// Variant-size lookup alone; `query` narrows the variant search when
    /// present but no full-text intersection is performed.
    SizeOnly {
        sizes: Vec<String>,
        query: Option<String>,
    },
    /// Single engine-paginated page of full-text hits.
    FullTextOnly { query: String },
    /// Defer entirely to the backend's own listing and filtering.
    Backend,
}

impl Strategy {
    /// Stable name for logs and degrade reasons.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FullTextCategorySize { .. } => "fulltext-category-size-intersection",
            Strategy::FullTextCategory { .. } => "fulltext-category-intersection",
            Strategy::FullTextSize { .. } => "fulltext-size-intersection",
            Strategy::SizeOnly { .. } => "size-only",
            Strategy::FullTextOnly { .. } => "fulltext-only",
            Strategy::Backend => "backend-listing",
        }
    }
}

/// Normalized inputs the selector decides on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPlan {
    /// Trimmed non-empty query, if any.
    pub query: Option<String>,
    /// Requested sort value, verbatim.
    pub sort: Option<String>,
    /// Normalized category handles (merged from every request field).
    pub categories: Vec<String>,
    /// Normalized size values.
    pub sizes: Vec<String>,
}

/// Trim the query; empty becomes `None`.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned)
}

/// Trim sizes, drop blanks, dedupe preserving first-seen order.
pub fn normalize_sizes<I, S>(sizes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe_ids(sizes)
}

/// Category handles get the same trim/dedupe treatment as sizes.
pub fn normalize_categories<I, S>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe_ids(categories)
}

/// Whether a sort value keeps the request eligible for full-text retrieval.
///
/// The full-text engine only returns relevance order, which the storefront
/// maps to the newest listing; any other sort must go through the backend.
fn sort_allows_fulltext(sort: Option<&str>) -> bool {
    matches!(sort, None | Some(SORT_NEWEST) | Some(SORT_CREATED_AT_DESC))
}

/// Pick the retrieval strategy for a normalized request. First matching
/// rule wins:
///
/// 1. size filter active and no category filter: full-text+size
///    intersection when a query is present, otherwise size-only;
/// 2. query present, no category, no size, sort absent or newest:
///    full-text only;
/// 3. anything else defers to the backend listing.
///
/// Category-filtered requests currently fall through to the backend
/// listing; the category-intersection variants stay constructible and
/// their fetchers remain callable directly.
pub fn select_strategy(plan: &SearchPlan) -> Strategy {
    let query = plan.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let has_category = !plan.categories.is_empty();
    let has_size = !plan.sizes.is_empty();

    if has_size && !has_category {
        return match query {
            Some(q) => Strategy::FullTextSize {
                query: q.to_owned(),
                sizes: plan.sizes.clone(),
            },
            None => Strategy::SizeOnly {
                sizes: plan.sizes.clone(),
                query: None,
            },
        };
    }

    if let Some(q) = query {
        if !has_category && !has_size && sort_allows_fulltext(plan.sort.as_deref()) {
            return Strategy::FullTextOnly {
                query: q.to_owned(),
            };
        }
    }

    Strategy::Backend
}
