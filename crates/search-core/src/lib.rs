//! Core logic for storefront product search orchestration.
//!
//! This crate is pure and I/O-free:
//!
//! - **Strategy**: maps a search request's shape to a retrieval path
//! - **Collection**: cursor-following paginated ID aggregation
//! - **Set algebra**: order-preserving dedupe, intersection, and merge
//! - **Flight cache**: TTL- and size-bounded sharing of in-flight
//!   collections
//!
//! The HTTP side lives in `search-client`, which feeds page fetchers and
//! hydration calls through these pieces.

pub mod cache;
pub mod collect;
pub mod error;
pub mod ids;
pub mod strategy;

pub use cache::{Clock, FlightCache, SystemClock, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use collect::{collect_ids, CollectOptions, IdPage, MAX_PAGINATION_ITERATIONS, PAGE_SIZE};
pub use error::SearchError;
pub use ids::{dedupe_ids, intersect_preserving_order, merge_preserving_order, order_by_ids};
pub use strategy::{
    normalize_categories, normalize_query, normalize_sizes, select_strategy, SearchPlan, Strategy,
};
