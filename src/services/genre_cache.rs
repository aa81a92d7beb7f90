use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    error::AppResult,
    models::{ContentCategory, Genre},
    services::{converter::GenreLookup, providers::MetadataProvider},
};

/// Genre id → display name for one content category.
///
/// Readers share the lock; a writer holds it exclusively for the duration of one
/// mutation.
#[derive(Debug, Default)]
pub struct GenreCache {
    entries: RwLock<HashMap<i64, String>>,
}

impl GenreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: i64, name: impl Into<String>) {
        self.write().insert(id, name.into());
    }

    pub fn get(&self, id: i64) -> Option<String> {
        self.read().get(&id).cloned()
    }

    pub fn delete(&self, id: i64) {
        self.write().remove(&id);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Snapshot copy; later writes are not visible through it
    pub fn get_all(&self) -> HashMap<i64, String> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clear and reload under a single write lock
    pub fn replace(&self, genres: Vec<Genre>) {
        let mut entries = self.write();
        entries.clear();
        entries.extend(genres.into_iter().map(|genre| (genre.id, genre.name)));
    }

    // The map stays consistent even if a writer panicked, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<i64, String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<i64, String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GenreLookup for GenreCache {
    fn genre_name(&self, id: i64) -> Option<String> {
        self.get(id)
    }
}

/// One [`GenreCache`] per content category
#[derive(Debug, Default)]
pub struct GenreCatalog {
    films: GenreCache,
    series: GenreCache,
}

impl GenreCatalog {
    /// Loads both categories concurrently; fails unless both fetches succeed
    pub async fn load(provider: &dyn MetadataProvider) -> AppResult<Self> {
        let catalog = Self::default();
        catalog.refresh(provider).await?;
        Ok(catalog)
    }

    /// Refetches both lists; existing entries survive a failed refresh
    pub async fn refresh(&self, provider: &dyn MetadataProvider) -> AppResult<()> {
        let (films, series) = tokio::try_join!(
            provider.genres(ContentCategory::Film),
            provider.genres(ContentCategory::Series),
        )?;

        tracing::info!(
            films = films.len(),
            series = series.len(),
            provider = provider.name(),
            "Genre cache loaded"
        );

        self.films.replace(films);
        self.series.replace(series);
        Ok(())
    }

    pub fn for_category(&self, category: ContentCategory) -> &GenreCache {
        match category {
            ContentCategory::Film => &self.films,
            ContentCategory::Series => &self.series,
        }
    }
}
