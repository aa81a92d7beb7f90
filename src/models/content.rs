use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Content category: every cache, converter and dispatch call is scoped to one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Film,
    Series,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 2] = [ContentCategory::Film, ContentCategory::Series];

    /// Path segment the provider uses for this category (`/movie/...`, `/tv/...`)
    pub fn provider_segment(self) -> &'static str {
        match self {
            ContentCategory::Film => "movie",
            ContentCategory::Series => "tv",
        }
    }

    /// Stable label used in storage rows and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Film => "film",
            ContentCategory::Series => "series",
        }
    }
}

impl Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized movie or series record, independent of the provider endpoint it came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: i64,
    pub category: ContentCategory,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    pub poster_url: String,
    pub backdrop_url: String,
    pub release_date: NaiveDate,
    pub vote_average: f64,
    pub vote_count: u64,
    /// Genre names in provider order
    pub genres: Vec<String>,
    /// ISO 3166-1 country codes
    pub origin_countries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
}

impl ContentItem {
    /// Natural key: the same numeric id may exist in both categories
    pub fn key(&self) -> (i64, ContentCategory) {
        (self.id, self.category)
    }
}

/// Provider genre, namespaced by category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Chat user as persisted by the storage collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}
