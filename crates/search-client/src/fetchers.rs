//! Product fetchers: the retrieval paths behind each strategy.
//!
//! Every fetcher resolves an ordered ID set, slices it to the requested
//! page, hydrates full product records for exactly that slice, and reorders
//! the hydrated records to the ID order (the hydration endpoint does not
//! guarantee request order).

use std::sync::Arc;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use search_core::{
    cache, collect_ids, dedupe_ids, intersect_preserving_order, merge_preserving_order,
    order_by_ids, CollectOptions, FlightCache, IdPage, SearchError, DEFAULT_CAPACITY,
    DEFAULT_TTL,
};

use crate::backend::{HydrationParams, StoreBackend};
use crate::types::{ProductPage, SearchRequest, StoreProduct};

/// Search orchestration service over a commerce backend.
///
/// Holds the per-collection flight caches, so identical collections within
/// the TTL window share a single upstream pass.
pub struct SearchService<B> {
    backend: Arc<B>,
    query_ids: FlightCache<Vec<String>>,
    size_ids: FlightCache<Vec<String>>,
    category_ids: FlightCache<Vec<String>>,
    max_collected_ids: Option<usize>,
}

impl<B: StoreBackend + 'static> SearchService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            query_ids: FlightCache::new(DEFAULT_TTL, DEFAULT_CAPACITY),
            size_ids: FlightCache::new(DEFAULT_TTL, DEFAULT_CAPACITY),
            category_ids: FlightCache::new(DEFAULT_TTL, DEFAULT_CAPACITY),
            max_collected_ids: None,
        }
    }

    /// Hard cap on any single ID collection; exceeding it fails the
    /// strategy rather than letting a runaway result set grow unbounded.
    pub fn with_max_collected_ids(mut self, max: usize) -> Self {
        self.max_collected_ids = Some(max);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Single engine-paginated page of full-text hits for `query`.
    ///
    /// The engine reports only an estimated total while more pages remain,
    /// so the count is `max(estimate, observed)` for a full page and the
    /// exact observed count otherwise.
    pub async fn fetch_fulltext_page(
        &self,
        query: &str,
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let page = self
            .backend
            .product_hits(query.trim(), req.limit, req.offset, req.cancel.as_ref())
            .await?;

        let observed = req.offset + page.hits.len();
        let count = if page.hits.len() >= req.limit {
            page.estimated_total_hits.unwrap_or(observed).max(observed)
        } else {
            observed
        };

        let ids = dedupe_ids(page.hits.iter().filter_map(|hit| hit.id.as_deref()));
        let products = self.hydrate(&ids, req).await?;
        Ok(ProductPage {
            products,
            count,
            limit: req.limit,
            offset: req.offset,
        })
    }

    /// Variant-size lookup alone, merged across sizes and paginated.
    pub async fn fetch_size_only(
        &self,
        sizes: &[String],
        query: Option<&str>,
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let merged = self
            .collect_sizes_merged(sizes, query, req.cancel.as_ref())
            .await?;
        let paged = page_slice(&merged, req.offset, req.limit);
        let products = self.hydrate(paged, req).await?;
        Ok(ProductPage {
            products,
            count: merged.len(),
            limit: req.limit,
            offset: req.offset,
        })
    }

    /// Complete full-text and variant-size ID sets, intersected with the
    /// engine's relevance order preserved, then paginated.
    pub async fn fetch_fulltext_size_intersection(
        &self,
        query: &str,
        sizes: &[String],
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let (query_ids, size_ids) = futures::try_join!(
            self.collect_query_ids(query, req.cancel.clone()),
            self.collect_sizes_merged(sizes, Some(query), req.cancel.as_ref()),
        )?;
        let intersection = intersect_preserving_order(query_ids.as_slice(), &size_ids);
        self.hydrate_id_page(intersection, req).await
    }

    /// Complete full-text and category-scoped ID sets, intersected with
    /// the engine's order preserved, then paginated.
    pub async fn fetch_fulltext_category_intersection(
        &self,
        query: &str,
        categories: &[String],
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let (query_ids, category_ids) = futures::try_join!(
            self.collect_query_ids(query, req.cancel.clone()),
            self.collect_category_ids(categories, req.cancel.clone()),
        )?;
        let intersection =
            intersect_preserving_order(query_ids.as_slice(), category_ids.as_slice());
        self.hydrate_id_page(intersection, req).await
    }

    /// Three-way intersection: full-text order, narrowed by category and
    /// size membership.
    pub async fn fetch_fulltext_category_size_intersection(
        &self,
        query: &str,
        categories: &[String],
        sizes: &[String],
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let (query_ids, category_ids, size_ids) = futures::try_join!(
            self.collect_query_ids(query, req.cancel.clone()),
            self.collect_category_ids(categories, req.cancel.clone()),
            self.collect_sizes_merged(sizes, Some(query), req.cancel.as_ref()),
        )?;
        let narrowed = intersect_preserving_order(query_ids.as_slice(), category_ids.as_slice());
        let intersection = intersect_preserving_order(&narrowed, &size_ids);
        self.hydrate_id_page(intersection, req).await
    }

    async fn hydrate_id_page(
        &self,
        ids: Vec<String>,
        req: &SearchRequest,
    ) -> Result<ProductPage, SearchError> {
        let paged = page_slice(&ids, req.offset, req.limit);
        let products = self.hydrate(paged, req).await?;
        Ok(ProductPage {
            products,
            count: ids.len(),
            limit: req.limit,
            offset: req.offset,
        })
    }

    /// Complete full-text ID set for `query`, shared through the flight
    /// cache.
    pub async fn collect_query_ids(
        &self,
        query: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Arc<Vec<String>>, SearchError> {
        let key = cache::query_key(query);
        let backend = Arc::clone(&self.backend);
        let query = query.trim().to_owned();
        let max_ids = self.max_collected_ids;
        self.query_ids
            .get_or_create(&key, move || async move {
                let opts = CollectOptions::new("products-hits")
                    .with_cancel(cancel.clone())
                    .with_max_ids(max_ids);
                collect_ids(
                    move |offset, limit| {
                        let backend = Arc::clone(&backend);
                        let query = query.clone();
                        let cancel = cancel.clone();
                        async move {
                            let page = backend
                                .product_hits(&query, limit, offset, cancel.as_ref())
                                .await?;
                            Ok(IdPage {
                                item_count: page.hits.len(),
                                total_count: page.estimated_total_hits,
                                ids: page.hits.into_iter().filter_map(|hit| hit.id).collect(),
                            })
                        }
                    },
                    opts,
                )
                .await
            })
            .await
    }

    /// Complete product-ID set for one size, shared through the flight
    /// cache under the `size::query` composite key.
    pub async fn collect_size_ids(
        &self,
        size: &str,
        query: Option<&str>,
        cancel: Option<CancellationToken>,
    ) -> Result<Arc<Vec<String>>, SearchError> {
        let key = cache::size_query_key(size, query.unwrap_or(""));
        let backend = Arc::clone(&self.backend);
        let size = size.trim().to_owned();
        let query = query.map(|q| q.trim().to_owned());
        let max_ids = self.max_collected_ids;
        self.size_ids
            .get_or_create(&key, move || async move {
                let opts = CollectOptions::new("product-variants")
                    .with_cancel(cancel.clone())
                    .with_max_ids(max_ids);
                collect_ids(
                    move |offset, limit| {
                        let backend = Arc::clone(&backend);
                        let size = size.clone();
                        let query = query.clone();
                        let cancel = cancel.clone();
                        async move {
                            let page = backend
                                .variant_page(&size, query.as_deref(), limit, offset, cancel.as_ref())
                                .await?;
                            Ok(IdPage {
                                item_count: page.variants.len(),
                                total_count: page.count,
                                ids: page
                                    .variants
                                    .into_iter()
                                    .filter_map(|row| row.product_id)
                                    .collect(),
                            })
                        }
                    },
                    opts,
                )
                .await
            })
            .await
    }

    /// Per-size collections run in parallel; the merge keeps each size's
    /// internal order with first-occurrence-across-sizes deduplication.
    pub async fn collect_sizes_merged(
        &self,
        sizes: &[String],
        query: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<String>, SearchError> {
        let collections = sizes
            .iter()
            .map(|size| self.collect_size_ids(size, query, cancel.cloned()));
        let collected = try_join_all(collections).await?;
        Ok(merge_preserving_order(
            collected.iter().map(|ids| ids.as_slice()),
        ))
    }

    /// Complete ID set of the category-scoped product listing.
    pub async fn collect_category_ids(
        &self,
        categories: &[String],
        cancel: Option<CancellationToken>,
    ) -> Result<Arc<Vec<String>>, SearchError> {
        let key = categories.join(",");
        let backend = Arc::clone(&self.backend);
        let categories = categories.to_vec();
        let max_ids = self.max_collected_ids;
        self.category_ids
            .get_or_create(&key, move || async move {
                let opts = CollectOptions::new("category-products")
                    .with_cancel(cancel.clone())
                    .with_max_ids(max_ids);
                collect_ids(
                    move |offset, limit| {
                        let backend = Arc::clone(&backend);
                        let categories = categories.clone();
                        let cancel = cancel.clone();
                        async move {
                            let page = backend
                                .category_product_page(&categories, limit, offset, cancel.as_ref())
                                .await?;
                            Ok(IdPage {
                                item_count: page.products.len(),
                                total_count: page.count,
                                ids: page.products.into_iter().map(|product| product.id).collect(),
                            })
                        }
                    },
                    opts,
                )
                .await
            })
            .await
    }

    /// Fetch full records for an already-sliced id page and restore the id
    /// order.
    async fn hydrate(
        &self,
        ids: &[String],
        req: &SearchRequest,
    ) -> Result<Vec<StoreProduct>, SearchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = HydrationParams {
            fields: req.fields.clone(),
            region_id: req.region_id.clone(),
            country_code: req.country_code.clone(),
        };
        let response = self
            .backend
            .products_by_ids(ids, &params, req.cancel.as_ref())
            .await?;
        Ok(order_by_ids(response.products, ids, |product| &product.id))
    }
}

fn page_slice(ids: &[String], offset: usize, limit: usize) -> &[String] {
    if offset >= ids.len() {
        return &[];
    }
    &ids[offset..(offset + limit).min(ids.len())]
}
