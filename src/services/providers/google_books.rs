//! Google Books volumes API provider
//!
//! API Flow:
//! `GET <api_url>?q=<query>&maxResults=<n>[&startIndex=<offset>][&orderBy=relevance][&key=<key>]`
//! → `{ "items": [ { "id", "volumeInfo": { ... } }, ... ] }`
//!
//! `items` is absent when nothing matched. Individual items that fail to
//! deserialize are skipped so one odd record cannot empty a whole page.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CandidateBook, GoogleVolume},
    services::providers::{CatalogProvider, SearchRequest},
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl GoogleBooksProvider {
    pub fn new(http_client: HttpClient, api_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Enables read-through caching of search pages
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    fn query_params(&self, request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", request.query.clone()),
            ("maxResults", request.max_results.to_string()),
        ];
        if request.order_by_relevance {
            params.push(("orderBy", "relevance".to_string()));
        }
        if let Some(start) = request.start_index {
            params.push(("startIndex", start.to_string()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }

    /// Parses a volumes response body into candidates
    fn parse_volumes(body: &str, reason: &str) -> AppResult<Vec<CandidateBook>> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            AppError::MalformedPayload(format!("Google Books response is not JSON: {}", e))
        })?;

        let items = match value.get("items") {
            None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
            Some(items) => items.as_array().ok_or_else(|| {
                AppError::MalformedPayload("Google Books `items` is not an array".to_string())
            })?,
        };

        Ok(items
            .iter()
            .filter_map(|item| serde_json::from_value::<GoogleVolume>(item.clone()).ok())
            .filter_map(|volume| volume.into_candidate(reason))
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for GoogleBooksProvider {
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
            let response = self
                .http_client
                .get(&self.api_url)
                .query(&self.query_params(request))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ExternalApi(format!(
                    "Google Books returned status {}: {}",
                    status, body
                )));
            }

            let body = response.text().await?;
            let books = Self::parse_volumes(&body, &request.query)?;

            tracing::info!(
                query = %request.query,
                start_index = request.start_index.unwrap_or(0),
                results = books.len(),
                provider = "google_books",
                "Catalog search completed"
            );

            Ok(books)
        })
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider(api_key: Option<&str>) -> GoogleBooksProvider {
        GoogleBooksProvider::new(
            HttpClient::new(),
            "http://127.0.0.1:1/books/v1/volumes".to_string(),
            api_key.map(str::to_string),
        )
    }

    #[test]
    fn test_query_params_full() {
        let provider = create_test_provider(Some("secret"));
        let request = SearchRequest::new("space opera", 10)
            .starting_at(20)
            .by_relevance();

        let params = provider.query_params(&request);
        assert_eq!(
            params,
            vec![
                ("q", "space opera".to_string()),
                ("maxResults", "10".to_string()),
                ("orderBy", "relevance".to_string()),
                ("startIndex", "20".to_string()),
                ("key", "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_minimal() {
        let provider = create_test_provider(Some(" "));
        let params = provider.query_params(&SearchRequest::new("inauthor:\"Le Guin\"", 8));
        assert_eq!(
            params,
            vec![
                ("q", "inauthor:\"Le Guin\"".to_string()),
                ("maxResults", "8".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_volumes_skips_invalid_items() {
        let body = r#"{
            "totalItems": 4,
            "items": [
                {"id": "1", "volumeInfo": {"title": "Dune", "authors": ["Frank Herbert"]}},
                {"id": "2", "volumeInfo": {"title": "No Author"}},
                {"id": "3", "volumeInfo": {"title": "Bad Pages", "authors": ["X"], "pageCount": "many"}},
                {"id": "4", "volumeInfo": {"title": "Children of Dune", "authors": ["Frank Herbert"]}}
            ]
        }"#;

        let books = GoogleBooksProvider::parse_volumes(body, "dune").unwrap();
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Children of Dune"]);
        assert!(books.iter().all(|b| b.reason == "dune"));
    }

    #[test]
    fn test_parse_volumes_without_items_is_empty() {
        let books = GoogleBooksProvider::parse_volumes(r#"{"totalItems": 0}"#, "q").unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn test_parse_volumes_rejects_malformed_body() {
        assert!(GoogleBooksProvider::parse_volumes("<html>rate limited</html>", "q").is_err());
        assert!(GoogleBooksProvider::parse_volumes(r#"{"items": {"id": 1}}"#, "q").is_err());
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let provider = create_test_provider(None);
        let result = provider.search(&SearchRequest::new("   ", 10)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_an_error() {
        let provider = create_test_provider(None);
        let result = provider.search(&SearchRequest::new("dune", 10)).await;
        assert!(result.is_err());
    }
}
