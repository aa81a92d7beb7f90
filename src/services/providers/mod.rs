/// Metadata provider abstraction
///
/// The aggregation layer only sees raw provider shapes through this trait; the
/// TMDB client is the production implementation. Providers are shared across
/// dispatch workers behind an `Arc`, so implementations must be stateless or
/// internally synchronized.
use crate::{
    error::AppResult,
    models::{ContentCategory, DetailsResponse, Genre, ListItem, Page},
};

pub mod tmdb;

pub use tmdb::{RequestOptions, TmdbProvider};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch one record with embedded genres and videos
    async fn details(&self, category: ContentCategory, id: i64) -> AppResult<DetailsResponse>;

    async fn popular(&self, category: ContentCategory, page: u32) -> AppResult<Page<ListItem>>;

    async fn top_rated(&self, category: ContentCategory, page: u32) -> AppResult<Page<ListItem>>;

    /// Items the provider recommends for a seed record
    async fn recommendations(
        &self,
        category: ContentCategory,
        id: i64,
    ) -> AppResult<Page<ListItem>>;

    /// Title search; the provider may return loose matches
    async fn search(&self, category: ContentCategory, title: &str) -> AppResult<Page<ListItem>>;

    /// Listing filtered server-side to items carrying every genre in `genre_ids`
    async fn discover(
        &self,
        category: ContentCategory,
        genre_ids: &[i64],
        page: u32,
    ) -> AppResult<Page<ListItem>>;

    async fn genres(&self, category: ContentCategory) -> AppResult<Vec<Genre>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
