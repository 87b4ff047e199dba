use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{OwnedBook, ReadingStatus},
    services::language_model::{extract_json_object, LanguageModel},
};

pub const MAX_TOP_GENRES: usize = 3;
pub const MAX_TOP_AUTHORS: usize = 2;
pub const MAX_SEARCH_QUERIES: usize = 4;
/// Books rated at least this are treated as favorites
pub const FAVORITE_RATING: u8 = 4;
/// Explicit ratings at or below this never feed the profile once favorites exist
pub const DISLIKED_RATING: u8 = 2;

/// Which analyzer produced a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStrategy {
    /// Language-model analysis with model-written search queries
    Assisted,
    /// Deterministic rating-weighted genre/author frequency
    Heuristic,
}

impl AnalysisStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStrategy::Assisted => "assisted",
            AnalysisStrategy::Heuristic => "heuristic",
        }
    }
}

/// The user's reading taste, derived once per request
#[derive(Debug, Clone, PartialEq)]
pub struct TasteProfile {
    pub strategy: AnalysisStrategy,
    pub profile: String,
    /// At most [`MAX_TOP_GENRES`], strongest first
    pub top_genres: Vec<String>,
    /// At most [`MAX_TOP_AUTHORS`]; heuristic only
    pub top_authors: Vec<String>,
    /// Catalog queries written by the model; assisted only
    pub search_queries: Vec<String>,
    /// Owned books rated 4 or 5, best first; heuristic only
    pub favorites: Vec<OwnedBook>,
}

/// Weight a book contributes to its genre and author
pub fn rating_weight(rating: u8) -> u32 {
    match rating {
        5 => 3,
        4 => 2,
        _ => 1,
    }
}

/// Accumulates rating weights per key, strongest first
///
/// Ties keep the order in which keys were first seen.
fn rank_by_weight<'a, I, F>(books: I, key: F) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = &'a OwnedBook>,
    F: Fn(&'a OwnedBook) -> Option<&'a str>,
{
    let mut ranked: Vec<(String, u32)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for book in books {
        let Some(name) = key(book) else { continue };
        let weight = rating_weight(book.stars());
        match positions.get(name) {
            Some(&index) => ranked[index].1 += weight,
            None => {
                positions.insert(name, ranked.len());
                ranked.push((name.to_string(), weight));
            }
        }
    }

    // sort_by is stable, which preserves first-seen order among equal weights
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Top keys from the favorites, topped up from the rest of the library
fn top_names<'a, F>(
    favorites: &'a [OwnedBook],
    rest: &'a [OwnedBook],
    key: F,
    limit: usize,
) -> Vec<String>
where
    F: Fn(&'a OwnedBook) -> Option<&'a str> + Copy,
{
    let mut names: Vec<String> = rank_by_weight(favorites, key)
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    for (name, _) in rank_by_weight(rest, key) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names.truncate(limit);
    names
}

/// Explicitly rated 1 or 2; unrated books are not disliked
fn is_disliked(book: &OwnedBook) -> bool {
    (1..=DISLIKED_RATING).contains(&book.stars())
}

fn author_name(book: &OwnedBook) -> Option<&str> {
    Some(book.author.trim()).filter(|author| !author.is_empty())
}

/// Deterministic taste analysis
///
/// Books rated 4 or 5 drive the ranking when there are any; unrated books and
/// books rated 3 only fill remaining slots, and books rated 1 or 2 are left
/// out. Without favorites the whole library is ranked directly.
pub fn analyze_heuristic(books: &[OwnedBook]) -> TasteProfile {
    let mut favorites: Vec<OwnedBook> = books
        .iter()
        .filter(|book| book.stars() >= FAVORITE_RATING)
        .cloned()
        .collect();
    favorites.sort_by(|a, b| b.stars().cmp(&a.stars()));

    let rest: Vec<OwnedBook> = books
        .iter()
        .filter(|book| book.stars() < FAVORITE_RATING && !is_disliked(book))
        .cloned()
        .collect();
    let (primary, secondary): (&[OwnedBook], &[OwnedBook]) = if favorites.is_empty() {
        (books, [].as_slice())
    } else {
        (favorites.as_slice(), rest.as_slice())
    };

    let top_genres = top_names(primary, secondary, OwnedBook::genre_name, MAX_TOP_GENRES);
    let top_authors = top_names(primary, secondary, author_name, MAX_TOP_AUTHORS);

    let profile = if favorites.is_empty() {
        format!(
            "You have {} books by {} and other authors",
            books.len(),
            top_authors.join(", ")
        )
    } else {
        let titles: Vec<&str> = favorites.iter().take(2).map(|b| b.title.as_str()).collect();
        format!(
            "Recommendations based on your {} highest-rated books: {}",
            favorites.len(),
            titles.join(", ")
        )
    };

    TasteProfile {
        strategy: AnalysisStrategy::Heuristic,
        profile,
        top_genres,
        top_authors,
        search_queries: Vec::new(),
        favorites,
    }
}

const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert book recommender. \
You study a reader's library and describe their taste. \
You answer with a single JSON object and nothing else.";

/// Library entry as shown to the model
#[derive(Serialize)]
struct PromptBook<'a> {
    title: &'a str,
    author: &'a str,
    genre: &'a str,
    rating: u8,
    status: ReadingStatus,
    pages: Option<u32>,
}

/// Shape the model is asked to return
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    #[serde(default)]
    user_profile: String,
    #[serde(default)]
    top_genres: Vec<String>,
    #[serde(default)]
    search_queries: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Language-model taste analysis
///
/// Failures are not retried: any error sends the caller to the heuristic path.
pub struct AssistedAnalyzer<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> AssistedAnalyzer<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    fn build_prompt(books: &[OwnedBook]) -> AppResult<String> {
        let library: Vec<PromptBook> = books
            .iter()
            .map(|book| PromptBook {
                title: &book.title,
                author: &book.author,
                genre: book.genre_name().unwrap_or("Not specified"),
                rating: book.stars(),
                status: book.status,
                pages: book.page_count,
            })
            .collect();
        let library = serde_json::to_string_pretty(&library)
            .map_err(|e| AppError::Internal(format!("Failed to serialize library: {}", e)))?;

        Ok(format!(
            r#"Analyze the reader's library below and plan personalized recommendations.

READER'S LIBRARY:
{library}

Respond ONLY with valid JSON in exactly this format:
{{
  "userProfile": "Short description of the reader (1-2 sentences)",
  "topGenres": ["genre1", "genre2", "genre3"],
  "searchQueries": [
    "Google Books search query 1",
    "Google Books search query 2",
    "Google Books search query 3",
    "Google Books search query 4"
  ],
  "reasoning": "Why these queries were chosen (1 sentence)"
}}

IMPORTANT:
- PRIORITIZE books rated 5: they are the ones the reader liked most
- Base the recommendations mainly on the highest-rated books
- Write searchQueries in English, they are sent to Google Books
- Consider genres and authors of the best-rated books
- Favor diversity across genres, not a single genre
- Never suggest books the reader already owns"#
        ))
    }

    fn parse_reply(reply: &str) -> AppResult<TasteProfile> {
        let value = extract_json_object(reply).ok_or_else(|| {
            AppError::MalformedPayload("Model reply contains no JSON object".to_string())
        })?;
        let analysis: ModelAnalysis = serde_json::from_value(value).map_err(|e| {
            AppError::MalformedPayload(format!("Unexpected analysis shape: {}", e))
        })?;

        let search_queries: Vec<String> = analysis
            .search_queries
            .into_iter()
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty())
            .take(MAX_SEARCH_QUERIES)
            .collect();
        if search_queries.is_empty() {
            return Err(AppError::MalformedPayload(
                "Model analysis has no search queries".to_string(),
            ));
        }

        if let Some(reasoning) = &analysis.reasoning {
            tracing::debug!(reasoning = %reasoning, "Model query reasoning");
        }

        Ok(TasteProfile {
            strategy: AnalysisStrategy::Assisted,
            profile: analysis.user_profile.trim().to_string(),
            top_genres: analysis
                .top_genres
                .into_iter()
                .filter(|genre| !genre.trim().is_empty())
                .take(MAX_TOP_GENRES)
                .collect(),
            top_authors: Vec::new(),
            search_queries,
            favorites: Vec::new(),
        })
    }

    pub async fn analyze(&self, books: &[OwnedBook]) -> AppResult<TasteProfile> {
        let prompt = Self::build_prompt(books)?;
        let reply = self.model.generate(ANALYSIS_SYSTEM_PROMPT, &prompt).await?;
        let profile = Self::parse_reply(&reply)?;

        tracing::info!(
            model = self.model.name(),
            genres = ?profile.top_genres,
            queries = profile.search_queries.len(),
            "Assisted taste analysis completed"
        );

        Ok(profile)
    }
}
