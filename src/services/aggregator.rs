use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::{
    models::{CandidateBook, OwnedBook},
    services::{
        catalog_search::search_catalog,
        providers::{CatalogProvider, SearchRequest},
        taste::TasteProfile,
    },
};

/// Pool size at which model-written queries stop being issued
pub const ASSISTED_POOL_TARGET: usize = 15;
/// Pool size at which the fallback strategies stop
pub const FALLBACK_POOL_TARGET: usize = 12;

const QUERY_PAGE_SIZE: u32 = 10;
const QUERY_OFFSETS: [u32; 3] = [0, 10, 20];

const GENRE_PAGE_SIZE: u32 = 8;
const GENRE_OFFSETS: [u32; 3] = [0, 10, 20];
const PER_GENRE: usize = 4;

const AUTHOR_PAGE_SIZE: u32 = 8;
const AUTHOR_OFFSETS: [u32; 2] = [0, 5];
const PER_AUTHOR: usize = 3;

const SIMILAR_PAGE_SIZE: u32 = 5;
const SIMILAR_SEEDS: usize = 3;
const PER_SEED: usize = 3;

/// Candidates collected so far plus every title already taken
///
/// Seeded with the owned titles so nothing in the library is suggested back.
/// Titles compare case-insensitively.
#[derive(Debug, Default)]
pub struct CandidatePool {
    seen: HashSet<String>,
    candidates: Vec<CandidateBook>,
}

impl CandidatePool {
    pub fn new(owned: &[OwnedBook]) -> Self {
        Self {
            seen: owned.iter().map(|book| title_key(&book.title)).collect(),
            candidates: Vec::new(),
        }
    }

    /// Adds a candidate unless it is invalid or its title was already seen
    pub fn offer(&mut self, candidate: CandidateBook) -> bool {
        if !candidate.is_valid() || !self.seen.insert(title_key(&candidate.title)) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn into_candidates(self) -> Vec<CandidateBook> {
        self.candidates
    }
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Uniform pick among pagination offsets, for variety across repeated requests
fn random_offset(choices: &[u32]) -> u32 {
    choices
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(0)
}

/// Turns a taste profile into a deduplicated candidate pool
///
/// Catalog calls run one after another: each call consults the titles gathered
/// by the previous ones.
pub struct CandidateAggregator<'a> {
    catalog: &'a dyn CatalogProvider,
}

impl<'a> CandidateAggregator<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider) -> Self {
        Self { catalog }
    }

    /// Assisted path: run each model-written query until the pool holds 15
    pub async fn from_queries(&self, queries: &[String], owned: &[OwnedBook]) -> Vec<CandidateBook> {
        let mut pool = CandidatePool::new(owned);

        for query in queries {
            if pool.len() >= ASSISTED_POOL_TARGET {
                break;
            }

            let request = SearchRequest::new(query.as_str(), QUERY_PAGE_SIZE)
                .starting_at(random_offset(&QUERY_OFFSETS))
                .by_relevance();

            for book in search_catalog(self.catalog, &request).await {
                pool.offer(book.with_reason(query.as_str()));
                if pool.len() >= ASSISTED_POOL_TARGET {
                    break;
                }
            }
        }

        tracing::info!(
            queries = queries.len(),
            candidates = pool.len(),
            "Collected candidates from model queries"
        );

        pool.into_candidates()
    }

    /// Fallback path: genres, then authors, then books similar to favorites
    pub async fn from_profile(&self, profile: &TasteProfile, owned: &[OwnedBook]) -> Vec<CandidateBook> {
        let mut pool = CandidatePool::new(owned);

        self.collect_by_genre(&mut pool, &profile.top_genres).await;
        self.collect_by_author(&mut pool, &profile.top_authors).await;
        if pool.len() < FALLBACK_POOL_TARGET {
            self.collect_similar(&mut pool, &profile.favorites).await;
        }

        tracing::info!(
            genres = profile.top_genres.len(),
            authors = profile.top_authors.len(),
            candidates = pool.len(),
            "Collected candidates from taste profile"
        );

        pool.into_candidates()
    }

    async fn collect_by_genre(&self, pool: &mut CandidatePool, genres: &[String]) {
        for genre in genres {
            if pool.len() >= FALLBACK_POOL_TARGET {
                return;
            }

            let request = SearchRequest::new(format!("subject:\"{}\"", genre), GENRE_PAGE_SIZE)
                .starting_at(random_offset(&GENRE_OFFSETS))
                .by_relevance();

            let books = search_catalog(self.catalog, &request).await;
            for book in books.into_iter().take(PER_GENRE) {
                pool.offer(book.with_reason(format!("Genre: {}", genre)));
                if pool.len() >= FALLBACK_POOL_TARGET {
                    return;
                }
            }
        }
    }

    async fn collect_by_author(&self, pool: &mut CandidatePool, authors: &[String]) {
        for author in authors {
            if pool.len() >= FALLBACK_POOL_TARGET {
                return;
            }

            let request = SearchRequest::new(format!("inauthor:\"{}\"", author), AUTHOR_PAGE_SIZE)
                .starting_at(random_offset(&AUTHOR_OFFSETS));

            let books = search_catalog(self.catalog, &request).await;
            for book in books.into_iter().take(PER_AUTHOR) {
                pool.offer(book.with_reason(format!("Author: {}", author)));
                if pool.len() >= FALLBACK_POOL_TARGET {
                    return;
                }
            }
        }
    }

    async fn collect_similar(&self, pool: &mut CandidatePool, favorites: &[OwnedBook]) {
        for seed in favorites.iter().take(SIMILAR_SEEDS) {
            if pool.len() >= FALLBACK_POOL_TARGET {
                return;
            }

            let request = SearchRequest::new(
                format!("\"{}\" \"{}\"", seed.title, seed.author),
                SIMILAR_PAGE_SIZE,
            );

            // The top hit is the seed book itself
            let books = search_catalog(self.catalog, &request).await;
            for book in books.into_iter().skip(1).take(PER_SEED) {
                pool.offer(book.with_reason(format!("Similar to: {}", seed.title)));
                if pool.len() >= FALLBACK_POOL_TARGET {
                    return;
                }
            }
        }
    }
}
