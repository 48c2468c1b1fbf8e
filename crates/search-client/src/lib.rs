//! HTTP search orchestration over the commerce backend.
//!
//! The entry point is [`SearchService::try_search`]: it normalizes the
//! request, picks a retrieval strategy, dispatches to the matching
//! fetcher, and degrades to the default backend listing on any failure
//! except cancellation.
//!
//! ```rust,ignore
//! use search_client::{SearchOutcome, SearchRequest, SearchService, StoreClient, StoreConfig};
//!
//! let client = StoreClient::new(StoreConfig::new(base_url, publishable_key));
//! let service = SearchService::new(client);
//!
//! let request = SearchRequest::new("cz")
//!     .with_query("triko")
//!     .with_sizes(vec!["M".into()]);
//! match service.try_search(&request).await? {
//!     SearchOutcome::Results(page) => render(page),
//!     SearchOutcome::Degraded(reason) => render_default_listing(reason),
//! }
//! ```

pub mod backend;
pub mod config;
pub mod fetchers;
pub mod http;
pub mod orchestrator;
pub mod suggest;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{HydrationParams, StoreBackend};
pub use config::{timeout_from_env, StoreConfig, DEFAULT_TIMEOUT_MS, TIMEOUT_ENV_VAR};
pub use fetchers::SearchService;
pub use http::StoreClient;
pub use orchestrator::{DegradeReason, SearchOutcome};
pub use suggest::{Suggestion, SuggestionService, Suggestions};
pub use types::{
    CategorySelector, ProductPage, SearchFilters, SearchRequest, StoreProduct,
    DEFAULT_PAGE_LIMIT,
};

pub use search_core::{SearchError, SearchPlan, Strategy};
