// ============================================================================
// TMDB API Types
// ============================================================================
//
// Movie and TV payloads differ only in field names (`title`/`name`,
// `release_date`/`first_air_date`), so each shape is one struct with serde aliases.

use serde::Deserialize;

use super::Genre;

/// Response from `GET /{movie|tv}/{id}?append_to_response=videos`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsResponse {
    pub id: i64,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, alias = "original_name")]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    #[serde(default)]
    pub production_countries: Vec<ProductionCountry>,
    #[serde(default)]
    pub videos: Option<VideoList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionCountry {
    pub iso_3166_1: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Embedded video metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub iso_3166_1: String,
}

/// Item of a paged listing (popular, top rated, discover, search, recommendations)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItem {
    pub id: i64,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, alias = "original_name")]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub origin_country: Vec<String>,
}

/// Paged envelope shared by every listing endpoint; only the current page's
/// results are consumed
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    pub fn of(results: Vec<T>) -> Self {
        Self { results }
    }
}

/// Response from `GET /genre/{movie|tv}/list`
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<Genre>,
}
