//! Trait seam over the commerce backend's REST endpoints.
//!
//! Fetchers and services talk to this trait rather than to the HTTP client
//! directly, so tests drive them with in-memory backends.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use search_core::SearchError;

use crate::types::{
    ProductHitsResponse, ProductListResponse, SuggestionHitsResponse, VariantListResponse,
};

/// Parameters forwarded to product hydration.
#[derive(Debug, Clone, Default)]
pub struct HydrationParams {
    pub fields: Option<String>,
    pub region_id: Option<String>,
    pub country_code: String,
}

/// The commerce backend as the search layer consumes it.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// One page of full-text product hits for `query`.
    async fn product_hits(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductHitsResponse, SearchError>;

    /// One page of product variants with option value `size`, optionally
    /// narrowed by query text, projected to product ids.
    async fn variant_page(
        &self,
        size: &str,
        query: Option<&str>,
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<VariantListResponse, SearchError>;

    /// One page of the category-scoped product listing, projected to ids.
    async fn category_product_page(
        &self,
        categories: &[String],
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError>;

    /// Hydrate full product records for an already-sliced page of ids.
    async fn products_by_ids(
        &self,
        ids: &[String],
        params: &HydrationParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError>;

    /// Category suggestions for a typed prefix.
    async fn category_hits(
        &self,
        query: &str,
        limit: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError>;

    /// Producer suggestions for a typed prefix.
    async fn producer_hits(
        &self,
        query: &str,
        limit: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError>;
}
