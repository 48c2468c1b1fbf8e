//! Strategy dispatch and the degrade-gracefully failure policy.

use tracing::{debug, warn};

use search_core::{select_strategy, SearchError, Strategy};

use crate::backend::StoreBackend;
use crate::fetchers::SearchService;
use crate::types::{ProductPage, SearchRequest};

/// Why a search degraded to the default backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// The selector deferred the request to the backend's own listing and
    /// filtering; nothing failed.
    BackendListing,
    /// The chosen strategy (and its inner fallback, if any) failed.
    StrategyFailed {
        strategy: &'static str,
        message: String,
    },
}

/// Outcome of a search attempt.
///
/// `Degraded` tells the caller to fall back to the default backend
/// listing, carrying the reason so it can choose to surface a notice
/// instead of falling back silently.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results(ProductPage),
    Degraded(DegradeReason),
}

impl SearchOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SearchOutcome::Degraded(_))
    }

    pub fn into_page(self) -> Option<ProductPage> {
        match self {
            SearchOutcome::Results(page) => Some(page),
            SearchOutcome::Degraded(_) => None,
        }
    }
}

impl<B: StoreBackend + 'static> SearchService<B> {
    /// Run the search strategies for a request.
    ///
    /// Failure policy: cancellation always propagates as an error, through
    /// every fallback layer. Any other failure is logged and returned as
    /// `Degraded`, so end users see the default listing rather than an
    /// error page. The size-intersection path retries once with the
    /// size-only fetcher before degrading.
    pub async fn try_search(&self, req: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        if let Some(token) = &req.cancel {
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
        }

        let plan = req.plan();
        let strategy = select_strategy(&plan);
        debug!(strategy = strategy.name(), "selected search strategy");

        let fetched = match &strategy {
            Strategy::Backend => {
                return Ok(SearchOutcome::Degraded(DegradeReason::BackendListing));
            }
            Strategy::FullTextOnly { query } => self.fetch_fulltext_page(query, req).await,
            Strategy::FullTextSize { query, sizes } => {
                match self.fetch_fulltext_size_intersection(query, sizes, req).await {
                    Err(err) if !err.is_cancellation() => {
                        warn!(
                            error = %err,
                            "size intersection failed, retrying size-only"
                        );
                        self.fetch_size_only(sizes, Some(query), req).await
                    }
                    other => other,
                }
            }
            Strategy::SizeOnly { sizes, query } => {
                self.fetch_size_only(sizes, query.as_deref(), req).await
            }
            Strategy::FullTextCategory { query, categories } => {
                self.fetch_fulltext_category_intersection(query, categories, req)
                    .await
            }
            Strategy::FullTextCategorySize {
                query,
                categories,
                sizes,
            } => {
                self.fetch_fulltext_category_size_intersection(query, categories, sizes, req)
                    .await
            }
        };

        match fetched {
            Ok(page) => Ok(SearchOutcome::Results(page)),
            Err(err) if err.is_cancellation() => Err(err),
            Err(err) => {
                warn!(
                    strategy = strategy.name(),
                    error = %err,
                    "search strategy failed, deferring to backend listing"
                );
                Ok(SearchOutcome::Degraded(DegradeReason::StrategyFailed {
                    strategy: strategy.name(),
                    message: err.to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::testing::MockBackend;

    fn req() -> SearchRequest {
        SearchRequest::new("cz").with_pagination(0, 24)
    }

    #[tokio::test]
    async fn test_fulltext_query_returns_results() {
        let backend = MockBackend::default().with_fulltext_ids(["p_1", "p_2"]);
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_query("triko").with_sort("newest"))
            .await
            .unwrap();
        let page = outcome.into_page().unwrap();
        assert_eq!(page.products.len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_sort_defers_to_backend() {
        let backend = MockBackend::default().with_fulltext_ids(["p_1"]);
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_query("triko").with_sort("name-asc"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Degraded(DegradeReason::BackendListing)
        ));
        assert_eq!(service.backend().hits_calls(), 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_request_propagates() {
        let backend = MockBackend::default();
        let service = SearchService::new(backend);
        let token = CancellationToken::new();
        token.cancel();

        let err = service
            .try_search(&req().with_query("triko").with_cancel(token))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_strategy_failure_degrades_with_reason() {
        let backend = MockBackend::default()
            .failing_hits(SearchError::Transport("engine down".into()));
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_query("triko"))
            .await
            .unwrap();
        match outcome {
            SearchOutcome::Degraded(DegradeReason::StrategyFailed { strategy, message }) => {
                assert_eq!(strategy, "fulltext-only");
                assert!(message.contains("engine down"));
            }
            other => panic!("expected degraded outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_from_fetcher_is_never_degraded() {
        let backend = MockBackend::default().failing_hits(SearchError::Cancelled);
        let service = SearchService::new(backend);

        let err = service
            .try_search(&req().with_query("triko"))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_size_intersection_falls_back_to_size_only() {
        let backend = MockBackend::default()
            .failing_hits(SearchError::Transport("engine down".into()))
            .with_size("M", ["p_1", "p_2"]);
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_query("triko").with_sizes(vec!["M".into()]))
            .await
            .unwrap();
        let page = outcome.into_page().unwrap();
        let ids: Vec<&str> = page.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p_1", "p_2"]);
    }

    #[tokio::test]
    async fn test_size_intersection_degrades_when_both_paths_fail() {
        let backend = MockBackend::default()
            .failing_hits(SearchError::Transport("engine down".into()))
            .failing_variants(SearchError::Transport("variants down".into()));
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_query("triko").with_sizes(vec!["M".into()]))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Degraded(DegradeReason::StrategyFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_size_intersection_cancellation_skips_the_fallback() {
        let backend = MockBackend::default()
            .failing_hits(SearchError::Cancelled)
            .with_size("M", ["p_1"]);
        let service = SearchService::new(backend);

        let err = service
            .try_search(&req().with_query("triko").with_sizes(vec!["M".into()]))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_size_filter_without_query_runs_size_only() {
        let backend = MockBackend::default().with_size("M", ["p_1"]);
        let service = SearchService::new(backend);

        let outcome = service
            .try_search(&req().with_sizes(vec!["M".into()]))
            .await
            .unwrap();
        let page = outcome.into_page().unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(service.backend().hits_calls(), 0);
    }

    #[tokio::test]
    async fn test_category_filter_defers_to_backend_listing() {
        let backend = MockBackend::default().with_fulltext_ids(["p_1"]);
        let service = SearchService::new(backend);

        let mut request = req().with_query("triko");
        request.filters.categories = vec!["shirts".into()];
        let outcome = service.try_search(&request).await.unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Degraded(DegradeReason::BackendListing)
        ));
    }
}
