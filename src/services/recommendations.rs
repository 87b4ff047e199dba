use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Analysis, CandidateBook, OwnedBook, RecommendationResponse},
    services::{
        aggregator::CandidateAggregator,
        language_model::LanguageModel,
        library::LibraryStore,
        providers::CatalogProvider,
        ranker::{Ranker, MAX_RECOMMENDATIONS},
        taste::{analyze_heuristic, AssistedAnalyzer, TasteProfile},
    },
};

pub const EMPTY_LIBRARY_MESSAGE: &str =
    "Add some books to your library to receive personalized recommendations!";
pub const ASSISTED_MESSAGE: &str = "Recommendations tailored to your reading profile!";
pub const FAVORITES_MESSAGE: &str = "Recommendations based on your favorite books!";
pub const RATE_BOOKS_TIP: &str = "Tip: rate your books to get even better recommendations!";
pub const NO_GENRE_PLACEHOLDER: &str = "Based on your favorite books";

/// Generates personalized book recommendations
///
/// Loads the library, analyzes taste (language model first, heuristic on any
/// failure), collects catalog candidates and ranks them. Only a library that
/// cannot be read even on the heuristic retry surfaces as an error.
#[derive(Clone)]
pub struct RecommendationService {
    library: Arc<dyn LibraryStore>,
    catalog: Arc<dyn CatalogProvider>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl RecommendationService {
    pub fn new(
        library: Arc<dyn LibraryStore>,
        catalog: Arc<dyn CatalogProvider>,
        language_model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        Self {
            library,
            catalog,
            language_model,
        }
    }

    pub async fn recommend(&self) -> AppResult<RecommendationResponse> {
        match self.run().await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation pipeline failed, retrying heuristic only");
                self.run_heuristic_only().await.inspect_err(|e| {
                    tracing::error!(error = %e, "Heuristic retry failed");
                })
            }
        }
    }

    async fn run(&self) -> AppResult<RecommendationResponse> {
        let books = self.library.list_owned_books().await?;
        if books.is_empty() {
            return Ok(empty_library_response());
        }

        if let Some(model) = self.language_model.as_deref() {
            match AssistedAnalyzer::new(model).analyze(&books).await {
                Ok(profile) => return Ok(self.assisted(&books, &profile, model).await),
                Err(e) => {
                    tracing::warn!(
                        model = model.name(),
                        error = %e,
                        "Assisted analysis failed, falling back to heuristic analysis"
                    );
                }
            }
        }

        Ok(self.heuristic(&books).await)
    }

    async fn run_heuristic_only(&self) -> AppResult<RecommendationResponse> {
        let books = self.library.list_owned_books().await?;
        if books.is_empty() {
            return Ok(empty_library_response());
        }
        Ok(self.heuristic(&books).await)
    }

    async fn assisted(
        &self,
        books: &[OwnedBook],
        profile: &TasteProfile,
        model: &dyn LanguageModel,
    ) -> RecommendationResponse {
        let candidates = CandidateAggregator::new(self.catalog.as_ref())
            .from_queries(&profile.search_queries, books)
            .await;
        let recommendations = Ranker::new(Some(model))
            .rank(candidates, &profile.profile)
            .await;

        respond(books, profile, recommendations, ASSISTED_MESSAGE)
    }

    async fn heuristic(&self, books: &[OwnedBook]) -> RecommendationResponse {
        let profile = analyze_heuristic(books);
        let mut recommendations = CandidateAggregator::new(self.catalog.as_ref())
            .from_profile(&profile, books)
            .await;
        recommendations.truncate(MAX_RECOMMENDATIONS);

        let message = if profile.top_genres.is_empty() {
            RATE_BOOKS_TIP
        } else {
            FAVORITES_MESSAGE
        };
        respond(books, &profile, recommendations, message)
    }
}

fn empty_library_response() -> RecommendationResponse {
    RecommendationResponse {
        recommendations: Vec::new(),
        analysis: None,
        message: EMPTY_LIBRARY_MESSAGE.to_string(),
    }
}

fn respond(
    books: &[OwnedBook],
    profile: &TasteProfile,
    recommendations: Vec<CandidateBook>,
    message: &str,
) -> RecommendationResponse {
    let favorite_genres = if profile.top_genres.is_empty() {
        vec![NO_GENRE_PLACEHOLDER.to_string()]
    } else {
        profile.top_genres.clone()
    };
    let profile_text = if profile.profile.is_empty() {
        format!("Based on the {} books in your library", books.len())
    } else {
        profile.profile.clone()
    };

    tracing::info!(
        strategy = profile.strategy.as_str(),
        books = books.len(),
        recommendations = recommendations.len(),
        "Recommendations generated"
    );

    RecommendationResponse {
        recommendations,
        analysis: Some(Analysis {
            total_books: books.len(),
            profile: profile_text,
            favorite_genres,
        }),
        message: message.to_string(),
    }
}
