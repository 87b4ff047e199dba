use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reading status of a book in the user's library
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    WantToRead,
    Reading,
    Finished,
    Paused,
    Abandoned,
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "want_to_read" => Ok(ReadingStatus::WantToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "finished" => Ok(ReadingStatus::Finished),
            "paused" => Ok(ReadingStatus::Paused),
            "abandoned" => Ok(ReadingStatus::Abandoned),
            other => Err(format!("unknown reading status '{}'", other)),
        }
    }
}

/// A book already in the user's library
///
/// Read-only to the recommendation pipeline; owned by the library store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: Option<String>,
    /// 1-5 stars; `None` or 0 means unrated
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default)]
    pub page_count: Option<u32>,
}

impl OwnedBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: None,
            rating: None,
            status: ReadingStatus::default(),
            page_count: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Rating with "unrated" collapsed to 0
    pub fn stars(&self) -> u8 {
        self.rating.unwrap_or(0)
    }

    /// Genre name, ignoring blank values
    pub fn genre_name(&self) -> Option<&str> {
        self.genre
            .as_deref()
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
    }
}
