use serde::{Deserialize, Serialize};

pub mod owned_book;

pub use owned_book::{OwnedBook, ReadingStatus};

/// A book surfaced from the external catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBook {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Why the book was suggested ("Genre: Fantasy", "Author: X", a search query...)
    pub reason: String,
}

impl CandidateBook {
    /// Candidates without a title or an author never reach deduplication
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.author.trim().is_empty()
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Summary of the taste analysis returned alongside recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub total_books: usize,
    pub profile: String,
    pub favorite_genres: Vec<String>,
}

/// Response body of the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: Vec<CandidateBook>,
    pub analysis: Option<Analysis>,
    pub message: String,
}

/// Catalog lookup result returned by the book search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
}

impl From<CandidateBook> for CatalogItem {
    fn from(book: CandidateBook) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            pages: book.pages,
            synopsis: book.synopsis,
            cover: book.cover,
            isbn: book.isbn,
            published_year: book.published_year,
        }
    }
}

// ============================================================================
// Google Books API Types
// ============================================================================

/// A single entry of the Google Books `items` array
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub small_thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl GoogleVolumeInfo {
    /// ISBN-13 when present, else ISBN-10
    pub fn preferred_isbn(&self) -> Option<String> {
        let find = |kind: &str| {
            self.industry_identifiers
                .iter()
                .find(|i| i.identifier_type == kind)
                .map(|i| i.identifier.clone())
        };
        find("ISBN_13").or_else(|| find("ISBN_10"))
    }

    /// The larger thumbnail when both sizes are offered
    pub fn preferred_cover(&self) -> Option<String> {
        self.image_links
            .as_ref()
            .and_then(|links| links.thumbnail.clone().or_else(|| links.small_thumbnail.clone()))
    }

    /// Year prefix of `publishedDate` ("2005", "2005-03", "2005-03-01")
    pub fn published_year(&self) -> Option<i32> {
        self.published_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }
}

impl GoogleVolume {
    /// Maps a volume to a candidate; `None` when the title or first author is missing
    pub fn into_candidate(self, reason: &str) -> Option<CandidateBook> {
        let info = self.volume_info;
        let title = info.title.clone().filter(|t| !t.trim().is_empty())?;
        let author = info
            .authors
            .first()
            .cloned()
            .filter(|a| !a.trim().is_empty())?;

        Some(CandidateBook {
            id: self.id,
            title,
            author,
            cover: info.preferred_cover(),
            synopsis: info.description.clone(),
            pages: info.page_count,
            published_year: info.published_year(),
            isbn: info.preferred_isbn(),
            genre: info.categories.first().cloned(),
            reason: reason.to_string(),
        })
    }
}

// ============================================================================
// Open Library API Types
// ============================================================================

/// A single entry of the Open Library search `docs` array
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryDoc {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub number_of_pages_median: Option<u32>,
    #[serde(default)]
    pub cover_i: Option<u64>,
    #[serde(default)]
    pub isbn: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub subject: Vec<String>,
}

impl OpenLibraryDoc {
    pub fn into_candidate(self, reason: &str) -> Option<CandidateBook> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let author = self
            .author_name
            .into_iter()
            .next()
            .filter(|a| !a.trim().is_empty())?;

        let id = match (self.key, self.cover_i) {
            (Some(key), _) => key,
            (None, Some(cover)) => format!("cover-{}", cover),
            (None, None) => format!("ol-{}", title.to_lowercase().replace(' ', "-")),
        };

        Some(CandidateBook {
            id,
            title,
            author,
            cover: self
                .cover_i
                .map(|cover| format!("https://covers.openlibrary.org/b/id/{}-M.jpg", cover)),
            synopsis: None,
            pages: self.number_of_pages_median,
            published_year: self.first_publish_year,
            isbn: self.isbn.into_iter().next(),
            genre: self.subject.into_iter().next(),
            reason: reason.to_string(),
        })
    }
}
