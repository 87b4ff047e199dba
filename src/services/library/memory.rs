use std::path::Path;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::OwnedBook,
    services::library::LibraryStore,
};

/// Library kept in process memory
///
/// Used when no database is configured, optionally seeded from a JSON file
/// holding an array of books.
#[derive(Clone, Default)]
pub struct InMemoryLibraryStore {
    books: Arc<Vec<OwnedBook>>,
}

impl InMemoryLibraryStore {
    pub fn new(books: Vec<OwnedBook>) -> Self {
        Self {
            books: Arc::new(books),
        }
    }

    /// Loads the library from a JSON array of books
    pub async fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Internal(format!("Failed to read library file {}: {}", path.display(), e))
        })?;
        let books: Vec<OwnedBook> = serde_json::from_str(&contents).map_err(|e| {
            AppError::InvalidInput(format!("Invalid library file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), books = books.len(), "Loaded library file");

        Ok(Self::new(books))
    }
}

#[async_trait::async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn list_owned_books(&self) -> AppResult<Vec<OwnedBook>> {
        Ok(self.books.as_ref().clone())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_seeded_books() {
        assert!(InMemoryLibraryStore::default()
            .list_owned_books()
            .await
            .unwrap()
            .is_empty());

        let store =
            InMemoryLibraryStore::new(vec![OwnedBook::new("Dune", "Frank Herbert").with_rating(5)]);
        let books = store.list_owned_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].stars(), 5);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("library-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"[{"title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction", "rating": 5, "status": "finished"}]"#,
        )
        .await
        .unwrap();

        let store = InMemoryLibraryStore::from_json_file(&path).await.unwrap();
        let books = store.list_owned_books().await.unwrap();
        assert_eq!(books[0].genre_name(), Some("Science Fiction"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_from_missing_file_is_an_error() {
        let result = InMemoryLibraryStore::from_json_file("/nonexistent/library.json").await;
        assert!(result.is_err());
    }
}
