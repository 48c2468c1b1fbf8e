//! Search-as-you-type suggestions from the category and producer indexes.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use search_core::SearchError;

use crate::backend::StoreBackend;
use crate::types::SuggestionHit;

/// Default number of suggestions per group.
pub const DEFAULT_GROUP_LIMIT: usize = 5;

/// One suggestion entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
}

/// Grouped suggestions for a typed prefix.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Suggestions {
    pub categories: Vec<Suggestion>,
    pub producers: Vec<Suggestion>,
}

/// Thin service over the two suggestion indexes.
///
/// Both lookups run in parallel and share the orchestrator's failure
/// policy: a failed group comes back empty with a warning, and only
/// cancellation propagates.
pub struct SuggestionService<B> {
    backend: Arc<B>,
    group_limit: usize,
}

impl<B: StoreBackend> SuggestionService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            group_limit: DEFAULT_GROUP_LIMIT,
        }
    }

    pub fn with_group_limit(mut self, limit: usize) -> Self {
        self.group_limit = limit.max(1);
        self
    }

    pub async fn suggest(
        &self,
        query: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Suggestions, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Suggestions::default());
        }
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
        }

        let (categories, producers) = futures::join!(
            self.backend.category_hits(query, self.group_limit, cancel),
            self.backend.producer_hits(query, self.group_limit, cancel),
        );

        Ok(Suggestions {
            categories: self.into_group("categories-hits", categories.map(|r| r.hits))?,
            producers: self.into_group("producers-hits", producers.map(|r| r.hits))?,
        })
    }

    /// Map one group's result: hits on success, empty on non-cancellation
    /// failure.
    fn into_group(
        &self,
        source: &str,
        hits: Result<Vec<SuggestionHit>, SearchError>,
    ) -> Result<Vec<Suggestion>, SearchError> {
        let hits = match hits {
            Ok(hits) => hits,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(source, error = %err, "suggestion lookup failed, returning empty group");
                return Ok(Vec::new());
            }
        };

        let mut seen = std::collections::HashSet::new();
        let mut group = Vec::new();
        for hit in hits {
            let Some(id) = hit.id.filter(|id| !id.trim().is_empty()) else {
                continue;
            };
            let id = id.trim().to_owned();
            if !seen.insert(id.clone()) {
                continue;
            }
            let label = hit
                .name
                .or(hit.handle)
                .unwrap_or_else(|| id.clone());
            group.push(Suggestion { id, label });
            if group.len() >= self.group_limit {
                break;
            }
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[tokio::test]
    async fn test_blank_query_returns_empty_without_io() {
        let service = SuggestionService::new(MockBackend::default());
        let got = service.suggest("   ", None).await.unwrap();
        assert!(got.categories.is_empty());
        assert!(got.producers.is_empty());
    }

    #[tokio::test]
    async fn test_groups_are_fetched_and_labelled() {
        let backend = MockBackend::default()
            .with_category_suggestion("cat_1", "Shirts")
            .with_producer_suggestion("pro_1", "Acme");
        let service = SuggestionService::new(backend);

        let got = service.suggest("shi", None).await.unwrap();
        assert_eq!(
            got.categories,
            vec![Suggestion {
                id: "cat_1".into(),
                label: "Shirts".into()
            }]
        );
        assert_eq!(
            got.producers,
            vec![Suggestion {
                id: "pro_1".into(),
                label: "Acme".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_group_limit_caps_each_group() {
        let mut backend = MockBackend::default();
        for n in 0..10 {
            backend = backend.with_category_suggestion(&format!("cat_{n}"), "C");
        }
        let service = SuggestionService::new(backend).with_group_limit(3);

        let got = service.suggest("c", None).await.unwrap();
        assert_eq!(got.categories.len(), 3);
    }

    #[tokio::test]
    async fn test_upstream_failure_degrades_to_empty_groups() {
        let backend = MockBackend::default()
            .failing_suggestions(SearchError::Transport("down".into()));
        let service = SuggestionService::new(backend);

        let got = service.suggest("shi", None).await.unwrap();
        assert!(got.categories.is_empty());
        assert!(got.producers.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let backend =
            MockBackend::default().failing_suggestions(SearchError::Cancelled);
        let service = SuggestionService::new(backend);

        let err = service.suggest("shi", None).await.unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_rejects_before_io() {
        let service = SuggestionService::new(MockBackend::default());
        let token = CancellationToken::new();
        token.cancel();
        let err = service.suggest("shi", Some(&token)).await.unwrap_err();
        assert!(err.is_cancellation());
    }
}
