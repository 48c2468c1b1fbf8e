//! Wire types for the commerce backend and the request/result shapes the
//! orchestrator exposes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use search_core::{normalize_categories, normalize_query, normalize_sizes, SearchPlan};

/// Default page size for storefront listings.
pub const DEFAULT_PAGE_LIMIT: usize = 24;

/// One hit from the full-text products index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductHit {
    #[serde(default)]
    pub id: Option<String>,
}

/// Response of `/store/meilisearch/products-hits`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductHitsResponse {
    #[serde(default)]
    pub hits: Vec<ProductHit>,
    /// The engine reports only an estimate while not exhausted.
    #[serde(default, rename = "estimatedTotalHits")]
    pub estimated_total_hits: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// One row of `/store/product-variants` projected to its product id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantRow {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Response of `/store/product-variants`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantListResponse {
    #[serde(default)]
    pub variants: Vec<VariantRow>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// A commerce-backend product projection. Only `id` is interpreted here;
/// everything else passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProduct {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl StoreProduct {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }
}

/// Response of `/store/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub products: Vec<StoreProduct>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// One hit from a suggestion index (categories or producers).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionHit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

/// Response of `/store/meilisearch/categories-hits` and
/// `/store/meilisearch/producers-hits`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionHitsResponse {
    #[serde(default)]
    pub hits: Vec<SuggestionHit>,
    #[serde(default, rename = "estimatedTotalHits")]
    pub estimated_total_hits: Option<usize>,
}

/// The uniform page every fetcher returns, regardless of strategy.
///
/// `products` follow the resolved ID order sliced to
/// `[offset, offset + limit)`; `count` is the total matching ID-set size
/// before pagination.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<StoreProduct>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Category selection as storefront pages send it: a single handle or a
/// list of handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategorySelector {
    One(String),
    Many(Vec<String>),
}

impl CategorySelector {
    pub fn values(&self) -> &[String] {
        match self {
            CategorySelector::One(value) => std::slice::from_ref(value),
            CategorySelector::Many(values) => values,
        }
    }
}

/// Structured filters carried by a search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// A storefront search request, constructed by a page and consumed once by
/// the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub limit: usize,
    pub offset: usize,
    /// Field projection forwarded to product hydration.
    pub fields: Option<String>,
    pub query: Option<String>,
    pub sort: Option<String>,
    pub category: Option<CategorySelector>,
    pub filters: SearchFilters,
    pub region_id: Option<String>,
    pub country_code: String,
    /// Cooperative cancellation for the whole request.
    pub cancel: Option<CancellationToken>,
}

impl SearchRequest {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            country_code: country_code.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_pagination(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit.max(1);
        self
    }

    pub fn with_sizes(mut self, sizes: Vec<String>) -> Self {
        self.filters.sizes = sizes;
        self
    }

    pub fn with_category(mut self, category: CategorySelector) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_region(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = Some(region_id.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Normalize into the selector's input: trimmed query, deduped sizes,
    /// and category handles merged from both request fields.
    pub fn plan(&self) -> SearchPlan {
        let categories = self
            .category
            .iter()
            .flat_map(|selector| selector.values().iter())
            .chain(self.filters.categories.iter());
        SearchPlan {
            query: normalize_query(self.query.as_deref()),
            sort: self.sort.clone(),
            categories: normalize_categories(categories),
            sizes: normalize_sizes(&self.filters.sizes),
        }
    }
}
