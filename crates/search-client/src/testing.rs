//! In-memory backend for driving the service in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use search_core::SearchError;

use crate::backend::{HydrationParams, StoreBackend};
use crate::types::{
    ProductHit, ProductHitsResponse, ProductListResponse, StoreProduct, SuggestionHit,
    SuggestionHitsResponse, VariantListResponse, VariantRow,
};

/// Scripted [`StoreBackend`]: serves fixed ID universes page by page and
/// counts calls. Hydration deliberately returns records in reverse request
/// order so callers must reorder.
#[derive(Default)]
pub struct MockBackend {
    fulltext_ids: Vec<String>,
    estimated_total: Option<usize>,
    sizes: HashMap<String, Vec<String>>,
    category_ids: Vec<String>,
    missing_products: HashSet<String>,
    category_suggestions: Vec<(String, String)>,
    producer_suggestions: Vec<(String, String)>,
    fail_hits: Option<SearchError>,
    fail_variants: Option<SearchError>,
    fail_suggestions: Option<SearchError>,
    hits_calls: AtomicUsize,
    variant_calls: AtomicUsize,
    hydrate_calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_fulltext_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fulltext_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_estimated_total(mut self, total: usize) -> Self {
        self.estimated_total = Some(total);
        self
    }

    pub fn with_size<I, S>(mut self, size: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes
            .insert(size.to_owned(), ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_category_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_product(mut self, id: &str) -> Self {
        self.missing_products.insert(id.to_owned());
        self
    }

    pub fn with_category_suggestion(mut self, id: &str, name: &str) -> Self {
        self.category_suggestions
            .push((id.to_owned(), name.to_owned()));
        self
    }

    pub fn with_producer_suggestion(mut self, id: &str, name: &str) -> Self {
        self.producer_suggestions
            .push((id.to_owned(), name.to_owned()));
        self
    }

    pub fn failing_hits(mut self, err: SearchError) -> Self {
        self.fail_hits = Some(err);
        self
    }

    pub fn failing_variants(mut self, err: SearchError) -> Self {
        self.fail_variants = Some(err);
        self
    }

    pub fn failing_suggestions(mut self, err: SearchError) -> Self {
        self.fail_suggestions = Some(err);
        self
    }

    pub fn hits_calls(&self) -> usize {
        self.hits_calls.load(Ordering::SeqCst)
    }

    pub fn variant_calls(&self) -> usize {
        self.variant_calls.load(Ordering::SeqCst)
    }

    pub fn hydrate_calls(&self) -> usize {
        self.hydrate_calls.load(Ordering::SeqCst)
    }
}

fn slice_page(ids: &[String], offset: usize, limit: usize) -> Vec<String> {
    if offset >= ids.len() {
        return Vec::new();
    }
    ids[offset..(offset + limit).min(ids.len())].to_vec()
}

#[async_trait]
impl StoreBackend for MockBackend {
    async fn product_hits(
        &self,
        _query: &str,
        limit: usize,
        offset: usize,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ProductHitsResponse, SearchError> {
        self.hits_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_hits {
            return Err(err.clone());
        }
        let page = slice_page(&self.fulltext_ids, offset, limit);
        Ok(ProductHitsResponse {
            hits: page.into_iter().map(|id| ProductHit { id: Some(id) }).collect(),
            estimated_total_hits: Some(self.estimated_total.unwrap_or(self.fulltext_ids.len())),
            limit: Some(limit),
            offset: Some(offset),
        })
    }

    async fn variant_page(
        &self,
        size: &str,
        _query: Option<&str>,
        limit: usize,
        offset: usize,
        _cancel: Option<&CancellationToken>,
    ) -> Result<VariantListResponse, SearchError> {
        self.variant_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_variants {
            return Err(err.clone());
        }
        let ids = self.sizes.get(size).cloned().unwrap_or_default();
        let page = slice_page(&ids, offset, limit);
        Ok(VariantListResponse {
            variants: page
                .into_iter()
                .map(|id| VariantRow {
                    product_id: Some(id),
                })
                .collect(),
            count: Some(ids.len()),
        })
    }

    async fn category_product_page(
        &self,
        _categories: &[String],
        limit: usize,
        offset: usize,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError> {
        let page = slice_page(&self.category_ids, offset, limit);
        Ok(ProductListResponse {
            products: page.into_iter().map(StoreProduct::new).collect(),
            count: Some(self.category_ids.len()),
        })
    }

    async fn products_by_ids(
        &self,
        ids: &[String],
        _params: &HydrationParams,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError> {
        self.hydrate_calls.fetch_add(1, Ordering::SeqCst);
        let products: Vec<StoreProduct> = ids
            .iter()
            .rev()
            .filter(|id| !self.missing_products.contains(*id))
            .map(|id| StoreProduct::new(id.clone()))
            .collect();
        Ok(ProductListResponse {
            count: Some(products.len()),
            products,
        })
    }

    async fn category_hits(
        &self,
        _query: &str,
        limit: usize,
        _cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError> {
        if let Some(err) = &self.fail_suggestions {
            return Err(err.clone());
        }
        Ok(suggestion_response(&self.category_suggestions, limit))
    }

    async fn producer_hits(
        &self,
        _query: &str,
        limit: usize,
        _cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError> {
        if let Some(err) = &self.fail_suggestions {
            return Err(err.clone());
        }
        Ok(suggestion_response(&self.producer_suggestions, limit))
    }
}

fn suggestion_response(entries: &[(String, String)], limit: usize) -> SuggestionHitsResponse {
    SuggestionHitsResponse {
        hits: entries
            .iter()
            .take(limit)
            .map(|(id, name)| SuggestionHit {
                id: Some(id.clone()),
                name: Some(name.clone()),
                handle: None,
            })
            .collect(),
        estimated_total_hits: Some(entries.len()),
    }
}
