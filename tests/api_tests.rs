use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;

use bookshelf_recs::{
    api::{create_router, AppState, BookSearchResponse},
    error::{AppError, AppResult},
    models::{CandidateBook, OwnedBook, RecommendationResponse},
    services::{
        language_model::LanguageModel,
        library::{InMemoryLibraryStore, LibraryStore},
        providers::{CatalogProvider, SearchRequest},
        RecommendationService,
    },
};

fn book(title: &str, author: &str) -> CandidateBook {
    CandidateBook {
        id: format!("vol-{}", title.to_lowercase().replace(' ', "-")),
        title: title.to_string(),
        author: author.to_string(),
        cover: Some("https://books.example/cover.jpg".to_string()),
        synopsis: None,
        pages: Some(320),
        published_year: Some(1987),
        isbn: None,
        genre: Some("Science Fiction".to_string()),
        reason: String::new(),
    }
}

/// Catalog answering a fixed page per query and recording every request
#[derive(Default)]
struct FakeCatalog {
    per_query: usize,
    echo_owned_title: Option<String>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FakeCatalog {
    fn new(per_query: usize) -> Self {
        Self {
            per_query,
            ..Default::default()
        }
    }

    fn echoing(mut self, title: &str) -> Self {
        self.echo_owned_title = Some(title.to_string());
        self
    }

    fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<CandidateBook>> {
        self.requests.lock().unwrap().push(request.clone());

        let mut books: Vec<CandidateBook> = self
            .echo_owned_title
            .iter()
            .map(|title| book(title, "Frank Herbert"))
            .collect();
        books.extend((0..self.per_query).map(|i| book(&format!("{} {}", request.query, i), "Jane Doe")));
        Ok(books)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FailingLibrary;

#[async_trait::async_trait]
impl LibraryStore for FailingLibrary {
    async fn list_owned_books(&self) -> AppResult<Vec<OwnedBook>> {
        Err(AppError::Internal("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct FailingModel;

#[async_trait::async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _system: &str, _prompt: &str) -> AppResult<String> {
        Err(AppError::LanguageModel("service unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn dune() -> OwnedBook {
    OwnedBook::new("Dune", "Frank Herbert")
        .with_genre("Science Fiction")
        .with_rating(5)
}

fn server(
    library: Arc<dyn LibraryStore>,
    catalog: Arc<FakeCatalog>,
    fallback: Option<Arc<FakeCatalog>>,
    model: Option<Arc<dyn LanguageModel>>,
) -> TestServer {
    let recommender = RecommendationService::new(library, catalog.clone(), model);
    let fallback = fallback.map(|catalog| catalog as Arc<dyn CatalogProvider>);
    let app = create_router(AppState::new(recommender, catalog, fallback));
    TestServer::new(app).unwrap()
}

fn library_of(books: Vec<OwnedBook>) -> Arc<dyn LibraryStore> {
    Arc::new(InMemoryLibraryStore::new(books))
}

#[tokio::test]
async fn test_health_check() {
    let server = server(library_of(vec![]), Arc::new(FakeCatalog::new(0)), None, None);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_empty_library_gets_guidance_message() {
    let catalog = Arc::new(FakeCatalog::new(5));
    let server = server(library_of(vec![]), catalog.clone(), None, None);

    let response = server.get("/api/v1/recommendations").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendations"], Value::Array(vec![]));
    assert!(body["analysis"].is_null());
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert!(catalog.requests().is_empty());
}

#[tokio::test]
async fn test_single_favorite_book_never_suggests_itself() {
    let catalog = Arc::new(FakeCatalog::new(3).echoing("DUNE"));
    let server = server(library_of(vec![dune()]), catalog.clone(), None, None);

    let response = server.get("/api/v1/recommendations").await;

    response.assert_status_ok();
    let body: RecommendationResponse = response.json();
    assert!(!body.recommendations.is_empty());
    assert!(body.recommendations.len() <= 12);

    let mut seen = HashSet::from(["dune".to_string()]);
    for recommendation in &body.recommendations {
        assert!(seen.insert(recommendation.title.to_lowercase()));
    }

    let analysis = body.analysis.unwrap();
    assert_eq!(analysis.total_books, 1);
    assert_eq!(analysis.favorite_genres, vec!["Science Fiction"]);

    let queries: Vec<String> = catalog.requests().into_iter().map(|r| r.query).collect();
    assert_eq!(queries[0], "subject:\"Science Fiction\"");
    assert!(queries.contains(&"inauthor:\"Frank Herbert\"".to_string()));
}

#[tokio::test]
async fn test_recommendation_fields_are_camel_case() {
    let catalog = Arc::new(FakeCatalog::new(2));
    let server = server(library_of(vec![dune()]), catalog, None, None);

    let body: Value = server.get("/api/v1/recommendations").await.json();

    let first = &body["recommendations"][0];
    assert_eq!(first["publishedYear"], 1987);
    assert!(first.get("synopsis").is_none());
    assert!(first["reason"].as_str().unwrap().starts_with("Genre: "));
    assert_eq!(body["analysis"]["totalBooks"], 1);
    assert!(body["analysis"]["favoriteGenres"].is_array());
}

#[tokio::test]
async fn test_language_model_failure_still_succeeds() {
    let catalog = Arc::new(FakeCatalog::new(8));
    let server = server(
        library_of(vec![dune()]),
        catalog,
        None,
        Some(Arc::new(FailingModel)),
    );

    let response = server.get("/api/v1/recommendations").await;

    response.assert_status_ok();
    let body: RecommendationResponse = response.json();
    let analysis = body.analysis.unwrap();
    assert_eq!(
        analysis.profile,
        "Recommendations based on your 1 highest-rated books: Dune"
    );
    assert_eq!(body.message, "Recommendations based on your favorite books!");
    // four by genre, three by author, three similar to the favorite
    assert_eq!(body.recommendations.len(), 10);
}

#[tokio::test]
async fn test_unreachable_library_returns_500() {
    let server = server(Arc::new(FailingLibrary), Arc::new(FakeCatalog::new(3)), None, None);

    let response = server.get("/api/v1/recommendations").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch recommendations");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = server(library_of(vec![]), Arc::new(FakeCatalog::new(0)), None, None);

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc-123");

    let response = server.get("/health").await;
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_book_search_uses_primary_catalog() {
    let primary = Arc::new(FakeCatalog::new(30));
    let fallback = Arc::new(FakeCatalog::new(5));
    let server = server(library_of(vec![]), primary.clone(), Some(fallback.clone()), None);

    let response = server
        .get("/api/v1/books/search")
        .add_query_param("query", "left hand of darkness")
        .add_query_param("limit", 50)
        .await;

    response.assert_status_ok();
    let body: BookSearchResponse = response.json();
    assert_eq!(body.items.len(), 20);
    assert_eq!(body.items[0].title, "left hand of darkness 0");
    assert_eq!(primary.requests()[0].max_results, 20);
    assert!(fallback.requests().is_empty());
}

#[tokio::test]
async fn test_book_search_falls_back_when_primary_is_empty() {
    let primary = Arc::new(FakeCatalog::new(0));
    let fallback = Arc::new(FakeCatalog::new(2));
    let server = server(library_of(vec![]), primary.clone(), Some(fallback.clone()), None);

    let response = server
        .get("/api/v1/books/search")
        .add_query_param("query", "obscure title")
        .await;

    let body: BookSearchResponse = response.json();
    assert_eq!(body.items.len(), 2);
    assert_eq!(primary.requests()[0].max_results, 8);
    assert_eq!(fallback.requests().len(), 1);
}

#[tokio::test]
async fn test_blank_book_search_skips_upstream() {
    let primary = Arc::new(FakeCatalog::new(3));
    let server = server(library_of(vec![]), primary.clone(), None, None);

    let response = server
        .get("/api/v1/books/search")
        .add_query_param("query", "   ")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"], Value::Array(vec![]));
    assert!(primary.requests().is_empty());
}
