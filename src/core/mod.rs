//! Core fetch, cache and conversion abstractions

pub mod api;
pub mod cache;
pub mod config;
pub mod currency;
pub mod filter;
pub mod log;
pub mod view;

// Re-export main types for cleaner imports
pub use api::{FailureKind, PropertyApi};
pub use cache::{CacheKey, CachePolicy, FetchCache, QueryBuilder, QueryParams};
pub use currency::{RateTable, RateTableProvider};
pub use filter::{Currency, FilterState, FilterStore, Region};
pub use view::{FetchOutcome, RenderContext, RowDetails, ViewAdapter, ViewSpec, ViewState};
