//! External book catalog abstraction
//!
//! Each provider wraps one keyword-search API and normalizes its result shape
//! into [`CandidateBook`]. Google Books backs the recommendation pipeline; Open
//! Library is the secondary source for plain catalog lookups.
use crate::{error::AppResult, models::CandidateBook};

pub mod google_books;
pub mod open_library;

pub use google_books::GoogleBooksProvider;
pub use open_library::OpenLibraryProvider;

/// One keyword search against a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    /// Pagination offset; omitted from the upstream call when `None` or 0
    pub start_index: Option<u32>,
    /// Ask the catalog to order by relevance
    pub order_by_relevance: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into(),
            max_results,
            start_index: None,
            order_by_relevance: false,
        }
    }

    pub fn starting_at(mut self, start_index: u32) -> Self {
        self.start_index = Some(start_index).filter(|offset| *offset > 0);
        self
    }

    pub fn by_relevance(mut self) -> Self {
        self.order_by_relevance = true;
        self
    }

    /// Stable identity of the request, used as the cache key
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.query,
            self.max_results,
            self.start_index.unwrap_or(0),
            if self.order_by_relevance { "relevance" } else { "default" }
        )
    }
}

/// Trait for external book catalogs
///
/// Implementations return `Err` on transport or payload failures; callers in the
/// recommendation pipeline go through
/// [`search_catalog`](crate::services::catalog_search::search_catalog), which turns
/// those into an empty result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Runs a keyword search. Entries without a title or author are already dropped.
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<CandidateBook>>;

    /// Provider name for logging and cache keys
    fn name(&self) -> &'static str;
}
