use std::sync::Arc;

use crate::services::{providers::CatalogProvider, RecommendationService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommendationService>,
    /// Catalog behind the book search endpoint
    pub catalog: Arc<dyn CatalogProvider>,
    /// Queried only when `catalog` finds nothing
    pub fallback_catalog: Option<Arc<dyn CatalogProvider>>,
}

impl AppState {
    pub fn new(
        recommender: RecommendationService,
        catalog: Arc<dyn CatalogProvider>,
        fallback_catalog: Option<Arc<dyn CatalogProvider>>,
    ) -> Self {
        Self {
            recommender: Arc::new(recommender),
            catalog,
            fallback_catalog,
        }
    }
}
