//! Open Library search provider
//!
//! `GET <api_url>?q=<query>&limit=<n>[&offset=<offset>]` → `{ "docs": [ ... ] }`.
//! No credential and no ordering control; used as the secondary catalog.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CandidateBook, OpenLibraryDoc},
    services::providers::{CatalogProvider, SearchRequest},
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct OpenLibraryProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl OpenLibraryProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
            cache: None,
            cache_ttl: 0,
        }
    }

    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    fn parse_docs(body: &str, reason: &str) -> AppResult<Vec<CandidateBook>> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            AppError::MalformedPayload(format!("Open Library response is not JSON: {}", e))
        })?;

        let docs = value
            .get("docs")
            .and_then(|docs| docs.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(docs
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<OpenLibraryDoc>(doc).ok())
            .filter_map(|doc| doc.into_candidate(reason))
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for OpenLibraryProvider {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<CandidateBook>> {
        if request.query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let key = CacheKey::CatalogSearch {
            provider: self.name(),
            fingerprint: request.fingerprint(),
        };

        cached!(self.cache.as_ref(), key, self.cache_ttl, async move {
            let mut params = vec![
                ("q", request.query.clone()),
                ("limit", request.max_results.to_string()),
            ];
            if let Some(offset) = request.start_index {
                params.push(("offset", offset.to_string()));
            }

            let response = self
                .http_client
                .get(&self.api_url)
                .query(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(AppError::ExternalApi(format!(
                    "Open Library returned status {}",
                    status
                )));
            }

            let body = response.text().await?;
            let books = Self::parse_docs(&body, &request.query)?;

            tracing::info!(
                query = %request.query,
                results = books.len(),
                provider = "open_library",
                "Catalog search completed"
            );

            Ok(books)
        })
    }

    fn name(&self) -> &'static str {
        "open_library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docs() {
        let body = r#"{
            "numFound": 3,
            "docs": [
                {"key": "/works/OL1W", "title": "The Left Hand of Darkness", "author_name": ["Ursula K. Le Guin"], "cover_i": 42},
                {"key": "/works/OL2W", "title": "Untitled Author"},
                {"key": "/works/OL3W", "title": "The Dispossessed", "author_name": ["Ursula K. Le Guin"]}
            ]
        }"#;

        let books = OpenLibraryProvider::parse_docs(body, "le guin").unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(
            books[0].cover,
            Some("https://covers.openlibrary.org/b/id/42-M.jpg".to_string())
        );
        assert_eq!(books[1].cover, None);
    }

    #[test]
    fn test_parse_docs_tolerates_missing_docs() {
        let books = OpenLibraryProvider::parse_docs(r#"{"numFound": 0}"#, "q").unwrap();
        assert!(books.is_empty());
        assert!(OpenLibraryProvider::parse_docs("not json", "q").is_err());
    }
}
