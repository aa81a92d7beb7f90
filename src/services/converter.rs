/// Provider record → `ContentItem` normalization
///
/// Three response shapes converge here:
/// - detail (`/movie/{id}`, `/tv/{id}`): embedded genres and videos
/// - listing (popular, top rated, discover, search): numeric genre ids
/// - recommendation: listing shape plus the synopsis and recency filters
///
/// Conversion never touches the network. Genre ids are resolved through a
/// [`GenreLookup`], normally the warm per-category genre cache.
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
    error::ConversionError,
    models::{ContentCategory, ContentItem, DetailsResponse, ListItem, Video},
};

/// Rendered instead of `base_url + ""` when the provider has no image
pub const NO_IMAGE_URL: &str = "https://placehold.co/500x750?text=No+Image";

/// Recommendations released before this date are dropped
pub const RECENCY_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(date) => date,
    None => panic!("invalid recency cutoff"),
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TRAILER_TYPE: &str = "Trailer";
const TRAILER_SITES: [&str; 2] = ["YouTube", "Youtube"];
const TRAILER_URL_PREFIX: &str = "https://youtu.be/";

/// Resolves a numeric genre id to its display name
pub trait GenreLookup {
    fn genre_name(&self, id: i64) -> Option<String>;
}

impl GenreLookup for HashMap<i64, String> {
    fn genre_name(&self, id: i64) -> Option<String> {
        self.get(&id).cloned()
    }
}

/// Tries `primary` first, then `fallback`
pub struct ChainedLookup<'a> {
    pub primary: &'a dyn GenreLookup,
    pub fallback: &'a dyn GenreLookup,
}

impl GenreLookup for ChainedLookup<'_> {
    fn genre_name(&self, id: i64) -> Option<String> {
        self.primary
            .genre_name(id)
            .or_else(|| self.fallback.genre_name(id))
    }
}

#[derive(Debug, Clone)]
pub struct Converter {
    image_base_url: String,
    trailer_region: String,
}

impl Converter {
    /// `language` is the provider locale (`ru-RU`); its region part selects trailers
    pub fn new(image_base_url: impl Into<String>, language: &str) -> Self {
        let trailer_region = language
            .split_once('-')
            .map(|(_, region)| region)
            .unwrap_or(language)
            .to_uppercase();

        Self {
            image_base_url: image_base_url.into(),
            trailer_region,
        }
    }

    pub fn trailer_region(&self) -> &str {
        &self.trailer_region
    }

    pub fn image_url(&self, path: Option<&str>) -> String {
        match path {
            Some(path) if !path.is_empty() => format!("{}{}", self.image_base_url, path),
            _ => NO_IMAGE_URL.to_string(),
        }
    }

    /// Converts a detail response; used for primary lookups
    pub fn details(
        &self,
        category: ContentCategory,
        details: DetailsResponse,
    ) -> Result<ContentItem, ConversionError> {
        let release_date = parse_release_date(details.id, details.release_date.as_deref())?;

        let trailer_url = details
            .videos
            .as_ref()
            .and_then(|videos| trailer_url(&videos.results, &self.trailer_region));

        let origin_countries = if details.origin_country.is_empty() {
            details
                .production_countries
                .into_iter()
                .map(|country| country.iso_3166_1)
                .collect()
        } else {
            details.origin_country
        };

        Ok(ContentItem {
            id: details.id,
            category,
            title: display_title(&details.title, &details.original_title).to_string(),
            poster_url: self.image_url(details.poster_path.as_deref()),
            backdrop_url: self.image_url(details.backdrop_path.as_deref()),
            overview: details.overview,
            popularity: details.popularity,
            release_date,
            vote_average: details.vote_average,
            vote_count: details.vote_count,
            genres: details.genres.into_iter().map(|genre| genre.name).collect(),
            origin_countries,
            trailer_url,
        })
    }

    /// Converts one item of a paged listing
    pub fn listing(
        &self,
        category: ContentCategory,
        item: ListItem,
        genres: &dyn GenreLookup,
    ) -> Result<ContentItem, ConversionError> {
        let release_date = parse_release_date(item.id, item.release_date.as_deref())?;

        Ok(ContentItem {
            id: item.id,
            category,
            title: display_title(&item.title, &item.original_title).to_string(),
            poster_url: self.image_url(item.poster_path.as_deref()),
            backdrop_url: self.image_url(item.backdrop_path.as_deref()),
            genres: item
                .genre_ids
                .iter()
                .filter_map(|id| genres.genre_name(*id))
                .collect(),
            overview: item.overview,
            popularity: item.popularity,
            release_date,
            vote_average: item.vote_average,
            vote_count: item.vote_count,
            origin_countries: item.origin_country,
            trailer_url: None,
        })
    }

    /// Converts a recommendation item, rejecting empty synopses and stale releases
    pub fn recommendation(
        &self,
        category: ContentCategory,
        item: ListItem,
        genres: &dyn GenreLookup,
    ) -> Result<ContentItem, ConversionError> {
        if item.overview.trim().is_empty() {
            return Err(ConversionError::EmptySynopsis { id: item.id });
        }

        let converted = self.listing(category, item, genres)?;
        if converted.release_date < RECENCY_CUTOFF {
            return Err(ConversionError::StaleItem {
                id: converted.id,
                released: converted.release_date,
                cutoff: RECENCY_CUTOFF,
            });
        }

        Ok(converted)
    }
}

/// Localized title, falling back to the original-language title
pub fn display_title<'a>(title: &'a str, original_title: &'a str) -> &'a str {
    if title.is_empty() {
        original_title
    } else {
        title
    }
}

fn parse_release_date(id: i64, raw: Option<&str>) -> Result<NaiveDate, ConversionError> {
    let raw = raw.unwrap_or_default();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ConversionError::DateParse {
        id,
        value: raw.to_string(),
    })
}

/// First YouTube trailer published for `region`, as a short link
pub fn trailer_url(videos: &[Video], region: &str) -> Option<String> {
    videos
        .iter()
        .find(|video| {
            video.kind == TRAILER_TYPE
                && TRAILER_SITES.contains(&video.site.as_str())
                && video.iso_3166_1 == region
        })
        .map(|video| format!("{}{}", TRAILER_URL_PREFIX, video.key))
}
