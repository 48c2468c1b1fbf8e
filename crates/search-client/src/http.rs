//! HTTP client for the commerce backend.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use search_core::SearchError;

use crate::backend::{HydrationParams, StoreBackend};
use crate::config::StoreConfig;
use crate::types::{
    ProductHitsResponse, ProductListResponse, SuggestionHitsResponse, VariantListResponse,
};

/// Error bodies are truncated to this many bytes before being attached to
/// an error.
const MAX_ERROR_BODY_BYTES: usize = 512;

/// Reqwest-backed client for the storefront REST API.
///
/// Every call runs under the configured timeout and, when the caller
/// passes a token, a cooperative cancellation race: whichever fires first
/// aborts the request, and the resulting error records which one it was.
pub struct StoreClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// GET a JSON endpoint with query-string parameters.
    ///
    /// Non-2xx responses become [`SearchError::Http`] carrying status,
    /// status text, and a truncated body. No automatic retries; fallback
    /// decisions belong to the strategy layer.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        cancel: Option<&CancellationToken>,
    ) -> Result<T, SearchError> {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
        }

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let send = self
            .http
            .get(&url)
            .header("x-publishable-api-key", &self.config.publishable_key)
            .query(params)
            .send();

        let timeout = self.config.timeout;
        let timed = tokio::time::timeout(timeout, send);
        let outcome = match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return Err(SearchError::Cancelled),
                outcome = timed => outcome,
            },
            None => timed.await,
        };

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(SearchError::Transport(err.to_string())),
            Err(_elapsed) => return Err(SearchError::Timeout(timeout.as_millis() as u64)),
        };

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_owned();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Http {
                status: status.as_u16(),
                status_text,
                body: truncate_body(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| SearchError::Decode(err.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_BYTES {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[async_trait]
impl StoreBackend for StoreClient {
    async fn product_hits(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductHitsResponse, SearchError> {
        let params = [
            ("query", query.to_owned()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        self.get_json("/store/meilisearch/products-hits", &params, cancel)
            .await
    }

    async fn variant_page(
        &self,
        size: &str,
        query: Option<&str>,
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<VariantListResponse, SearchError> {
        let mut params = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("fields", "product_id".to_owned()),
            ("options[value]", size.to_owned()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_owned()));
        }
        self.get_json("/store/product-variants", &params, cancel)
            .await
    }

    async fn category_product_page(
        &self,
        categories: &[String],
        limit: usize,
        offset: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError> {
        let mut params = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("fields", "id".to_owned()),
        ];
        for category in categories {
            params.push(("category_id[]", category.clone()));
        }
        self.get_json("/store/products", &params, cancel).await
    }

    async fn products_by_ids(
        &self,
        ids: &[String],
        hydration: &HydrationParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProductListResponse, SearchError> {
        // The id page is already sliced, so the hydration call requests
        // exactly that slice rather than a page of its own.
        let mut params = vec![
            ("limit", ids.len().to_string()),
            ("offset", "0".to_owned()),
            ("country_code", hydration.country_code.clone()),
        ];
        if let Some(fields) = &hydration.fields {
            params.push(("fields", fields.clone()));
        }
        if let Some(region_id) = &hydration.region_id {
            params.push(("region_id", region_id.clone()));
        }
        for id in ids {
            params.push(("id[]", id.clone()));
        }
        self.get_json("/store/products", &params, cancel).await
    }

    async fn category_hits(
        &self,
        query: &str,
        limit: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError> {
        let params = [("query", query.to_owned()), ("limit", limit.to_string())];
        self.get_json("/store/meilisearch/categories-hits", &params, cancel)
            .await
    }

    async fn producer_hits(
        &self,
        query: &str,
        limit: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<SuggestionHitsResponse, SearchError> {
        let params = [("query", query.to_owned()), ("limit", limit.to_string())];
        self.get_json("/store/meilisearch/producers-hits", &params, cancel)
            .await
    }
}
