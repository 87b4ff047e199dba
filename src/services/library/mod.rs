//! Read access to the user's book library
//!
//! The recommendation pipeline only ever lists owned books; creating and editing
//! them belongs to the library application itself.
use crate::{error::AppResult, models::OwnedBook};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLibraryStore;
pub use postgres::PostgresLibraryStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    async fn list_owned_books(&self) -> AppResult<Vec<OwnedBook>>;

    fn name(&self) -> &'static str;
}
