use crate::{
    models::{CandidateBook, CatalogItem},
    services::providers::{CatalogProvider, SearchRequest},
};

pub const DEFAULT_LOOKUP_LIMIT: u32 = 8;
pub const MAX_LOOKUP_LIMIT: u32 = 20;

/// Runs one catalog search, degrading every failure to an empty page
///
/// Catalog flakiness must never abort a recommendation request, so transport
/// errors, bad statuses and malformed payloads are logged and swallowed here.
pub async fn search_catalog(
    provider: &dyn CatalogProvider,
    request: &SearchRequest,
) -> Vec<CandidateBook> {
    match provider.search(request).await {
        Ok(books) => books.into_iter().filter(CandidateBook::is_valid).collect(),
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                query = %request.query,
                error = %e,
                "Catalog search failed, continuing without its results"
            );
            Vec::new()
        }
    }
}

/// Plain catalog lookup used when adding a book by hand
///
/// Queries `primary` first and falls back to `secondary` only when the primary
/// catalog returns nothing.
pub async fn lookup_books(
    primary: &dyn CatalogProvider,
    secondary: Option<&dyn CatalogProvider>,
    query: &str,
    limit: Option<u32>,
) -> Vec<CatalogItem> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let limit = limit
        .unwrap_or(DEFAULT_LOOKUP_LIMIT)
        .clamp(1, MAX_LOOKUP_LIMIT);
    let request = SearchRequest::new(query, limit);

    let mut books = search_catalog(primary, &request).await;
    if books.is_empty() {
        if let Some(secondary) = secondary {
            tracing::debug!(
                query = %query,
                provider = secondary.name(),
                "Primary catalog empty, trying secondary"
            );
            books = search_catalog(secondary, &request).await;
        }
    }

    books
        .into_iter()
        .take(limit as usize)
        .map(CatalogItem::from)
        .collect()
}
