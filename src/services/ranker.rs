use std::collections::HashSet;

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::CandidateBook,
    services::language_model::{extract_index_array, LanguageModel},
};

/// Maximum number of recommendations returned to the user
pub const MAX_RECOMMENDATIONS: usize = 12;

const RANKING_SYSTEM_PROMPT: &str = "You rank book candidates for a reader. \
You answer with a JSON array of candidate indices and nothing else.";

#[derive(Serialize)]
struct RankingEntry<'a> {
    index: usize,
    title: &'a str,
    author: &'a str,
    genre: Option<&'a str>,
}

/// Orders candidates by relevance to the reader's profile
///
/// Pools that already fit in the result are returned untouched without a model
/// call. Any ranking failure keeps aggregation order.
pub struct Ranker<'a> {
    model: Option<&'a dyn LanguageModel>,
}

impl<'a> Ranker<'a> {
    pub fn new(model: Option<&'a dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn rank(&self, mut candidates: Vec<CandidateBook>, profile: &str) -> Vec<CandidateBook> {
        let model = match self.model {
            Some(model) if candidates.len() > MAX_RECOMMENDATIONS => model,
            _ => {
                candidates.truncate(MAX_RECOMMENDATIONS);
                return candidates;
            }
        };

        match Self::rank_with_model(model, &candidates, profile).await {
            Ok(order) => {
                tracing::info!(
                    candidates = candidates.len(),
                    ranked = order.len(),
                    "Ranked candidates with language model"
                );
                Self::apply_order(candidates, &order)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ranking failed, keeping aggregation order");
                candidates.truncate(MAX_RECOMMENDATIONS);
                candidates
            }
        }
    }

    async fn rank_with_model(
        model: &dyn LanguageModel,
        candidates: &[CandidateBook],
        profile: &str,
    ) -> AppResult<Vec<usize>> {
        let prompt = Self::build_prompt(candidates, profile)?;
        let reply = model.generate(RANKING_SYSTEM_PROMPT, &prompt).await?;

        let order: Vec<usize> = extract_index_array(&reply)
            .ok_or_else(|| {
                AppError::MalformedPayload("Ranking reply contains no index array".to_string())
            })?
            .into_iter()
            .filter(|index| *index < candidates.len())
            .collect();

        if order.is_empty() {
            return Err(AppError::MalformedPayload(
                "Ranking reply has no usable indices".to_string(),
            ));
        }

        Ok(order)
    }

    fn build_prompt(candidates: &[CandidateBook], profile: &str) -> AppResult<String> {
        let entries: Vec<RankingEntry> = candidates
            .iter()
            .enumerate()
            .map(|(index, book)| RankingEntry {
                index,
                title: &book.title,
                author: &book.author,
                genre: book.genre.as_deref(),
            })
            .collect();
        let entries = serde_json::to_string_pretty(&entries)
            .map_err(|e| AppError::Internal(format!("Failed to serialize candidates: {}", e)))?;

        Ok(format!(
            "Reader profile: {profile}\n\n\
             Books to rank:\n{entries}\n\n\
             Return ONLY a JSON array with the indices of the {MAX_RECOMMENDATIONS} best books, \
             ordered by relevance, for example:\n\
             [0, 5, 2, 8, 1, 3, 10, 7, 4, 9, 6, 11]"
        ))
    }

    /// Picks candidates in model order, skipping repeated indices
    fn apply_order(candidates: Vec<CandidateBook>, order: &[usize]) -> Vec<CandidateBook> {
        let mut slots: Vec<Option<CandidateBook>> = candidates.into_iter().map(Some).collect();
        let mut used = HashSet::new();

        order
            .iter()
            .filter(|index| used.insert(**index))
            .filter_map(|index| slots.get_mut(*index).and_then(Option::take))
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }
}
