pub mod aggregator;
pub mod catalog_search;
pub mod language_model;
pub mod library;
pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod taste;

pub use recommendations::RecommendationService;
