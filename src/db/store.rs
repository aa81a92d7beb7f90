use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{ContentCategory, Genre, User},
};

/// Durable storage used by the aggregation layer.
///
/// Genre names back up the in-memory cache for ids it does not know; favorite and
/// viewed sets are per user and per category.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Names for the subset of `ids` present in storage
    async fn genre_names(
        &self,
        category: ContentCategory,
        ids: &[i64],
    ) -> AppResult<HashMap<i64, String>>;

    /// Upserts the provider's genre list for `category`
    async fn save_genres(&self, category: ContentCategory, genres: &[Genre]) -> AppResult<()>;

    async fn upsert_user(&self, user: &User) -> AppResult<()>;

    async fn favorite_ids(&self, user_id: i64, category: ContentCategory) -> AppResult<Vec<i64>>;

    async fn add_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()>;

    async fn remove_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()>;

    async fn viewed_ids(&self, user_id: i64, category: ContentCategory) -> AppResult<Vec<i64>>;

    async fn mark_viewed(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()>;
}
