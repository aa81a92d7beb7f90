//! Category-polymorphic content aggregation.
//!
//! [`ContentService`] wires the provider, the per-category genre cache, the
//! response converter and the worker-pool dispatcher together. Multi-item
//! operations (ids, recommendations, title search) go through the dispatcher;
//! listings are a single paged provider call.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::ContentStore,
    error::{AppError, AppResult},
    models::{ContentCategory, ContentItem, Genre, ListItem, Page, User},
    services::{
        converter::{display_title, ChainedLookup, Converter, GenreLookup},
        dispatcher::Dispatcher,
        genre_cache::{GenreCache, GenreCatalog},
        providers::MetadataProvider,
    },
};

/// TMDB serves at most this many pages for any listing
pub const MAX_PAGE: u32 = 500;

#[derive(Debug, Clone, Copy)]
enum Listing {
    Popular,
    TopRated,
}

impl Listing {
    fn label(self) -> &'static str {
        match self {
            Listing::Popular => "popular",
            Listing::TopRated => "top_rated",
        }
    }
}

pub struct ContentService {
    provider: Arc<dyn MetadataProvider>,
    store: Option<Arc<dyn ContentStore>>,
    genres: Arc<GenreCatalog>,
    converter: Arc<Converter>,
    dispatcher: Dispatcher,
}

impl ContentService {
    /// Builds the service and warms the genre cache for both categories.
    ///
    /// Fails if either genre list cannot be fetched.
    pub async fn new(
        provider: Arc<dyn MetadataProvider>,
        converter: Converter,
        dispatcher: Dispatcher,
    ) -> AppResult<Self> {
        let genres = GenreCatalog::load(provider.as_ref()).await?;

        Ok(Self {
            provider,
            store: None,
            genres: Arc::new(genres),
            converter: Arc::new(converter),
            dispatcher,
        })
    }

    /// Attaches durable storage for genre fallback and per-user markers
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> AppResult<&Arc<dyn ContentStore>> {
        self.store.as_ref().ok_or(AppError::StorageUnavailable)
    }

    /// Single detail lookup; any conversion error is returned
    pub async fn get_by_id(&self, category: ContentCategory, id: i64) -> AppResult<ContentItem> {
        fetch_details(self.provider.clone(), self.converter.clone(), category, id).await
    }

    /// Detail lookups for a batch of ids.
    ///
    /// A provider or transport error for any id fails the batch; an id whose
    /// record cannot be converted is left out.
    pub async fn get_by_ids(
        &self,
        category: ContentCategory,
        ids: Vec<i64>,
    ) -> AppResult<Vec<ContentItem>> {
        let ids = dedup_preserving_order(ids);
        let requested = ids.len();

        let provider = self.provider.clone();
        let converter = self.converter.clone();
        let items = self
            .dispatcher
            .dispatch(ids, move |id| {
                let provider = provider.clone();
                let converter = converter.clone();
                async move {
                    match fetch_details(provider, converter, category, id).await {
                        Ok(item) => Ok(vec![item]),
                        Err(AppError::Conversion(e)) => {
                            tracing::warn!(
                                category = %category,
                                id,
                                error = %e,
                                "Skipping unconvertible item"
                            );
                            Ok(Vec::new())
                        }
                        Err(e) => Err(e),
                    }
                }
            })
            .await?;

        tracing::info!(
            category = %category,
            requested,
            items = items.len(),
            "Fetched content by ids"
        );

        Ok(items)
    }

    pub async fn get_popular(
        &self,
        category: ContentCategory,
        page: u32,
    ) -> AppResult<Vec<ContentItem>> {
        self.listing(category, Listing::Popular, page).await
    }

    pub async fn get_top_rated(
        &self,
        category: ContentCategory,
        page: u32,
    ) -> AppResult<Vec<ContentItem>> {
        self.listing(category, Listing::TopRated, page).await
    }

    async fn listing(
        &self,
        category: ContentCategory,
        listing: Listing,
        page: u32,
    ) -> AppResult<Vec<ContentItem>> {
        validate_page(page)?;

        let response = match listing {
            Listing::Popular => self.provider.popular(category, page).await?,
            Listing::TopRated => self.provider.top_rated(category, page).await?,
        };

        let items = self.convert_page(
            category,
            listing.label(),
            response,
            self.genres.for_category(category),
        );

        tracing::info!(
            category = %category,
            listing = listing.label(),
            page,
            items = items.len(),
            "Fetched listing"
        );

        Ok(items)
    }

    /// Listing filtered to items carrying every id in `genre_ids`
    pub async fn get_by_genre(
        &self,
        category: ContentCategory,
        genre_ids: &[i64],
        page: u32,
    ) -> AppResult<Vec<ContentItem>> {
        validate_page(page)?;
        if genre_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one genre id is required".to_string(),
            ));
        }

        let response = self.provider.discover(category, genre_ids, page).await?;

        let cache = self.genres.for_category(category);
        let fallback = self
            .stored_genre_names(category, cache, &response.results)
            .await;
        let lookup = ChainedLookup {
            primary: cache,
            fallback: &fallback,
        };

        let items = self.convert_page(category, "discover", response, &lookup);

        tracing::info!(
            category = %category,
            genres = ?genre_ids,
            page,
            items = items.len(),
            "Fetched content by genre"
        );

        Ok(items)
    }

    /// Names from storage for genre ids the cache does not know
    async fn stored_genre_names(
        &self,
        category: ContentCategory,
        cache: &GenreCache,
        items: &[ListItem],
    ) -> HashMap<i64, String> {
        let Some(store) = &self.store else {
            return HashMap::new();
        };

        let missing: Vec<i64> = items
            .iter()
            .flat_map(|item| item.genre_ids.iter().copied())
            .filter(|id| cache.get(*id).is_none())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if missing.is_empty() {
            return HashMap::new();
        }

        match store.genre_names(category, &missing).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    category = %category,
                    missing = missing.len(),
                    error = %e,
                    "Genre fallback lookup failed"
                );
                HashMap::new()
            }
        }
    }

    /// Converts each listing item, dropping the ones that fail
    fn convert_page(
        &self,
        category: ContentCategory,
        source: &'static str,
        page: Page<ListItem>,
        genres: &dyn GenreLookup,
    ) -> Vec<ContentItem> {
        page.results
            .into_iter()
            .filter_map(
                |item| match self.converter.listing(category, item, genres) {
                    Ok(converted) => Some(converted),
                    Err(e) => {
                        tracing::warn!(
                            category = %category,
                            source,
                            error = %e,
                            "Skipping listing item"
                        );
                        None
                    }
                },
            )
            .collect()
    }

    /// Recommendations for every seed id, most popular first.
    ///
    /// Items with an empty synopsis or released before the recency cutoff are
    /// skipped; a provider error for any seed fails the batch.
    pub async fn get_recommendations(
        &self,
        category: ContentCategory,
        seed_ids: Vec<i64>,
    ) -> AppResult<Vec<ContentItem>> {
        let seeds = dedup_preserving_order(seed_ids);
        let seed_count = seeds.len();

        let provider = self.provider.clone();
        let converter = self.converter.clone();
        let genres = self.genres.clone();
        let merged = self
            .dispatcher
            .dispatch(seeds, move |seed| {
                let provider = provider.clone();
                let converter = converter.clone();
                let genres = genres.clone();
                async move { fetch_recommendations(provider, converter, genres, category, seed).await }
            })
            .await?;

        let mut seen = HashSet::new();
        let mut items: Vec<ContentItem> = merged
            .into_iter()
            .filter(|item| seen.insert(item.id))
            .collect();
        items.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));

        tracing::info!(
            category = %category,
            seeds = seed_count,
            items = items.len(),
            "Fetched recommendations"
        );

        Ok(items)
    }

    /// Exact-title search across both categories
    pub async fn search_by_title(&self, titles: Vec<String>) -> AppResult<Vec<ContentItem>> {
        let titles = dedup_preserving_order(
            titles
                .into_iter()
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .collect(),
        );
        if titles.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let (mut items, series) = tokio::try_join!(
            self.search_category(ContentCategory::Film, titles.clone()),
            self.search_category(ContentCategory::Series, titles.clone()),
        )?;
        items.extend(series);

        tracing::info!(
            titles = ?titles,
            results = items.len(),
            provider = self.provider.name(),
            "Title search completed"
        );

        Ok(items)
    }

    async fn search_category(
        &self,
        category: ContentCategory,
        titles: Vec<String>,
    ) -> AppResult<Vec<ContentItem>> {
        let provider = self.provider.clone();
        let converter = self.converter.clone();
        let genres = self.genres.clone();
        self.dispatcher
            .dispatch(titles, move |title| {
                let provider = provider.clone();
                let converter = converter.clone();
                let genres = genres.clone();
                async move { search_exact(provider, converter, genres, category, title).await }
            })
            .await
    }

    /// Cached genres for `category`, sorted for display
    pub fn get_genres(&self, category: ContentCategory) -> Vec<Genre> {
        let mut genres: Vec<Genre> = self
            .genres
            .for_category(category)
            .get_all()
            .into_iter()
            .map(|(id, name)| Genre { id, name })
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        genres
    }

    /// Reloads both genre caches and mirrors them to storage when attached
    pub async fn refresh_genres(&self) -> AppResult<()> {
        self.genres.refresh(self.provider.as_ref()).await?;
        if self.store.is_some() {
            self.persist_genres().await?;
        }
        Ok(())
    }

    /// Writes the cached genre lists to storage
    pub async fn persist_genres(&self) -> AppResult<()> {
        let store = self.store()?;
        for category in ContentCategory::ALL {
            store
                .save_genres(category, &self.get_genres(category))
                .await?;
        }
        Ok(())
    }

    pub async fn register_user(&self, user: &User) -> AppResult<()> {
        self.store()?.upsert_user(user).await
    }

    pub async fn get_favorites(
        &self,
        user_id: i64,
        category: ContentCategory,
    ) -> AppResult<Vec<ContentItem>> {
        let ids = self.store()?.favorite_ids(user_id, category).await?;
        self.get_by_ids(category, ids).await
    }

    pub async fn add_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        self.store()?
            .add_favorite(user_id, category, content_id)
            .await
    }

    pub async fn remove_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        self.store()?
            .remove_favorite(user_id, category, content_id)
            .await
    }

    pub async fn get_viewed(
        &self,
        user_id: i64,
        category: ContentCategory,
    ) -> AppResult<Vec<ContentItem>> {
        let ids = self.store()?.viewed_ids(user_id, category).await?;
        self.get_by_ids(category, ids).await
    }

    pub async fn mark_viewed(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        self.store()?
            .mark_viewed(user_id, category, content_id)
            .await
    }
}

async fn fetch_details(
    provider: Arc<dyn MetadataProvider>,
    converter: Arc<Converter>,
    category: ContentCategory,
    id: i64,
) -> AppResult<ContentItem> {
    let details = provider.details(category, id).await?;
    let item = converter.details(category, details)?;
    Ok(item)
}

async fn fetch_recommendations(
    provider: Arc<dyn MetadataProvider>,
    converter: Arc<Converter>,
    genres: Arc<GenreCatalog>,
    category: ContentCategory,
    seed: i64,
) -> AppResult<Vec<ContentItem>> {
    let page = provider.recommendations(category, seed).await?;
    let cache = genres.for_category(category);

    Ok(page
        .results
        .into_iter()
        .filter_map(
            |item| match converter.recommendation(category, item, cache) {
                Ok(converted) => Some(converted),
                Err(e) => {
                    tracing::debug!(seed, error = %e, "Skipping recommendation");
                    None
                }
            },
        )
        .collect())
}

/// Provider search narrowed to results whose display title equals `title`
async fn search_exact(
    provider: Arc<dyn MetadataProvider>,
    converter: Arc<Converter>,
    genres: Arc<GenreCatalog>,
    category: ContentCategory,
    title: String,
) -> AppResult<Vec<ContentItem>> {
    let page = provider.search(category, &title).await?;
    let cache = genres.for_category(category);

    Ok(page
        .results
        .into_iter()
        .filter(|item| display_title(&item.title, &item.original_title) == title)
        .filter_map(|item| match converter.listing(category, item, cache) {
            Ok(converted) => Some(converted),
            Err(e) => {
                tracing::debug!(title = %title, error = %e, "Skipping search result");
                None
            }
        })
        .collect())
}

fn validate_page(page: u32) -> AppResult<()> {
    if page == 0 || page > MAX_PAGE {
        return Err(AppError::InvalidInput(format!(
            "Page must be between 1 and {}",
            MAX_PAGE
        )));
    }
    Ok(())
}

fn dedup_preserving_order<T: Clone + Eq + std::hash::Hash>(values: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockContentStore;
    use crate::models::DetailsResponse;
    use crate::services::converter::{NO_IMAGE_URL, RECENCY_CUTOFF};
    use crate::services::providers::MockMetadataProvider;
    use chrono::Duration as ChronoDuration;

    fn genre(id: i64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    /// Provider mock with genre lists already expected for cache warm-up
    fn provider() -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_genres().returning(|category| match category {
            ContentCategory::Film => Ok(vec![genre(18, "Drama"), genre(28, "Action")]),
            ContentCategory::Series => Ok(vec![genre(18, "Drama"), genre(16, "Animation")]),
        });
        provider.expect_name().return_const("mock");
        provider
    }

    async fn service(provider: MockMetadataProvider) -> ContentService {
        ContentService::new(
            Arc::new(provider),
            Converter::new("https://img.test", "ru-RU"),
            Dispatcher::new(5),
        )
        .await
        .unwrap()
    }

    fn details(id: i64, title: &str) -> DetailsResponse {
        DetailsResponse {
            id,
            title: title.to_string(),
            overview: format!("Overview of {}", title),
            release_date: Some("2015-06-09".to_string()),
            genres: vec![genre(18, "Drama")],
            ..Default::default()
        }
    }

    fn list_item(id: i64, title: &str, release_date: &str, popularity: f64) -> ListItem {
        ListItem {
            id,
            title: title.to_string(),
            overview: format!("Overview of {}", title),
            popularity,
            poster_path: Some(format!("/{}.jpg", id)),
            release_date: Some(release_date.to_string()),
            genre_ids: vec![18],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_by_ids_returns_each_requested_item() {
        let mut provider = provider();
        provider
            .expect_details()
            .times(2)
            .returning(|_, id| match id {
                150540 => Ok(details(150540, "A")),
                9737 => Ok(details(9737, "B")),
                other => Err(AppError::NotFound(other.to_string())),
            });
        let service = service(provider).await;

        let items = service
            .get_by_ids(ContentCategory::Film, vec![150540, 9737])
            .await
            .unwrap();

        let pairs: HashSet<(i64, String)> = items
            .iter()
            .map(|item| (item.id, item.title.clone()))
            .collect();
        assert_eq!(
            pairs,
            HashSet::from([(150540, "A".to_string()), (9737, "B".to_string())])
        );
        assert!(items
            .iter()
            .all(|item| item.category == ContentCategory::Film));
    }

    #[tokio::test]
    async fn test_get_by_ids_is_idempotent() {
        let mut provider = provider();
        provider
            .expect_details()
            .returning(|_, id| Ok(details(id, &format!("Title {}", id))));
        let service = service(provider).await;

        let ids = vec![1, 2, 3, 4, 5, 6, 7];
        let first: HashSet<(i64, ContentCategory)> = service
            .get_by_ids(ContentCategory::Series, ids.clone())
            .await
            .unwrap()
            .iter()
            .map(ContentItem::key)
            .collect();
        let second: HashSet<(i64, ContentCategory)> = service
            .get_by_ids(ContentCategory::Series, ids)
            .await
            .unwrap()
            .iter()
            .map(ContentItem::key)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[tokio::test]
    async fn test_get_by_ids_deduplicates_input() {
        let mut provider = provider();
        provider
            .expect_details()
            .times(2)
            .returning(|_, id| Ok(details(id, "Same")));
        let service = service(provider).await;

        let items = service
            .get_by_ids(ContentCategory::Film, vec![1, 2, 1, 2])
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_ids_fails_whole_batch_on_transport_error() {
        let mut provider = provider();
        provider.expect_details().returning(|_, id| {
            if id == 3 {
                Err(AppError::ExternalApi("connection reset".to_string()))
            } else {
                Ok(details(id, "Fine"))
            }
        });
        let service = service(provider).await;

        let result = service
            .get_by_ids(ContentCategory::Film, vec![1, 2, 3, 4, 5])
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_get_by_ids_skips_item_with_bad_date() {
        let mut provider = provider();
        provider.expect_details().times(5).returning(|_, id| {
            let mut record = details(id, &format!("Title {}", id));
            if id == 3 {
                record.release_date = Some(String::new());
            }
            Ok(record)
        });
        let service = service(provider).await;

        let items = service
            .get_by_ids(ContentCategory::Series, vec![1, 2, 3, 4, 5])
            .await
            .unwrap();

        let ids: HashSet<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, HashSet::from([1, 2, 4, 5]));
    }

    #[tokio::test]
    async fn test_get_by_id_date_error_is_fatal() {
        let mut provider = provider();
        provider.expect_details().returning(|_, id| {
            let mut response = details(id, "Undated");
            response.release_date = Some(String::new());
            Ok(response)
        });
        let service = service(provider).await;

        let result = service.get_by_id(ContentCategory::Series, 10).await;
        assert!(matches!(result, Err(AppError::Conversion(_))));
    }

    #[tokio::test]
    async fn test_popular_skips_unconvertible_items() {
        let mut provider = provider();
        provider.expect_popular().returning(|_, page| {
            assert_eq!(page, 2);
            let mut no_poster = list_item(3, "No Poster", "2020-01-01", 1.0);
            no_poster.poster_path = Some(String::new());
            Ok(Page::of(vec![
                list_item(1, "Good", "2019-05-05", 3.0),
                list_item(2, "Bad Date", "not a date", 2.0),
                no_poster,
            ]))
        });
        let service = service(provider).await;

        let items = service
            .get_popular(ContentCategory::Film, 2)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Good");
        assert_eq!(items[0].poster_url, "https://img.test/1.jpg");
        assert_eq!(items[0].genres, vec!["Drama"]);
        assert_eq!(items[1].poster_url, NO_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_top_rated_propagates_provider_errors() {
        let mut provider = provider();
        provider
            .expect_top_rated()
            .returning(|_, _| Err(AppError::ExternalApi("401".to_string())));
        let service = service(provider).await;

        let result = service.get_top_rated(ContentCategory::Series, 1).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_listing_rejects_invalid_page() {
        let service = service(provider()).await;

        assert!(matches!(
            service.get_popular(ContentCategory::Film, 0).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service.get_top_rated(ContentCategory::Film, MAX_PAGE + 1).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_recommendations_filter_dedup_and_sort() {
        let stale_date = (RECENCY_CUTOFF - ChronoDuration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let fresh_date = (RECENCY_CUTOFF + ChronoDuration::days(1))
            .format("%Y-%m-%d")
            .to_string();

        let mut provider = provider();
        provider
            .expect_recommendations()
            .times(2)
            .returning(move |_, seed| {
                let mut no_synopsis = list_item(30, "Silent", "2018-01-01", 99.0);
                no_synopsis.overview = String::new();
                Ok(match seed {
                    1 => Page::of(vec![
                        list_item(10, "Low", &fresh_date, 1.0),
                        list_item(11, "Old", &stale_date, 50.0),
                        no_synopsis,
                    ]),
                    _ => Page::of(vec![
                        list_item(20, "High", "2021-03-03", 80.0),
                        list_item(10, "Low", &fresh_date, 1.0),
                    ]),
                })
            });
        let service = service(provider).await;

        let items = service
            .get_recommendations(ContentCategory::Film, vec![1, 2])
            .await
            .unwrap();

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![20, 10]);
        assert!(items
            .iter()
            .all(|item| item.release_date >= RECENCY_CUTOFF && !item.overview.is_empty()));
    }

    #[tokio::test]
    async fn test_recommendations_abort_on_provider_error() {
        let mut provider = provider();
        provider.expect_recommendations().returning(|_, seed| {
            if seed == 2 {
                Err(AppError::ExternalApi("timeout".to_string()))
            } else {
                Ok(Page::of(vec![list_item(10, "Fine", "2015-01-01", 1.0)]))
            }
        });
        let service = service(provider).await;

        let result = service
            .get_recommendations(ContentCategory::Series, vec![1, 2, 3])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_keeps_exact_matches_in_both_categories() {
        let mut provider = provider();
        provider
            .expect_search()
            .times(2)
            .returning(|category, title: &str| {
                assert_eq!(title, "Heat");
                Ok(match category {
                    ContentCategory::Film => Page::of(vec![
                        list_item(949, "Heat", "1995-12-15", 40.0),
                        list_item(950, "Heat 2", "2026-01-01", 10.0),
                        list_item(951, "heat", "2001-01-01", 1.0),
                    ]),
                    ContentCategory::Series => {
                        let mut original_only = list_item(77, "", "2010-10-10", 5.0);
                        original_only.original_title = "Heat".to_string();
                        Page::of(vec![original_only, list_item(78, "The Heat", "2011-01-01", 2.0)])
                    }
                })
            });
        let service = service(provider).await;

        let items = service
            .search_by_title(vec!["  Heat ".to_string()])
            .await
            .unwrap();

        let keys: HashSet<(i64, ContentCategory)> = items.iter().map(ContentItem::key).collect();
        assert_eq!(
            keys,
            HashSet::from([(949, ContentCategory::Film), (77, ContentCategory::Series)])
        );
        assert!(items.iter().all(|item| item.title == "Heat"));
    }

    #[tokio::test]
    async fn test_search_rejects_blank_titles() {
        let service = service(provider()).await;
        let result = service
            .search_by_title(vec![" ".to_string(), String::new()])
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_by_genre_falls_back_to_storage_names() {
        let mut provider = provider();
        provider
            .expect_discover()
            .returning(|_, genre_ids: &[i64], page| {
                assert_eq!(genre_ids, &[18_i64]);
                assert_eq!(page, 1);
                let mut item = list_item(5, "Mixed", "2012-02-02", 4.0);
                item.genre_ids = vec![18, 777, 888];
                Ok(Page::of(vec![item]))
            });

        let mut store = MockContentStore::new();
        store
            .expect_genre_names()
            .times(1)
            .returning(|category, ids: &[i64]| {
                assert_eq!(category, ContentCategory::Series);
                assert_eq!(ids, &[777_i64, 888]);
                Ok(HashMap::from([(777, "Legacy".to_string())]))
            });

        let service = service(provider).await.with_store(Arc::new(store));
        let items = service
            .get_by_genre(ContentCategory::Series, &[18], 1)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].genres, vec!["Drama", "Legacy"]);
    }

    #[tokio::test]
    async fn test_by_genre_storage_failure_is_soft() {
        let mut provider = provider();
        provider.expect_discover().returning(|_, _: &[i64], _| {
            let mut item = list_item(5, "Mixed", "2012-02-02", 4.0);
            item.genre_ids = vec![18, 777];
            Ok(Page::of(vec![item]))
        });

        let mut store = MockContentStore::new();
        store
            .expect_genre_names()
            .returning(|_, _: &[i64]| Err(AppError::Internal("db down".to_string())));

        let service = service(provider).await.with_store(Arc::new(store));
        let items = service
            .get_by_genre(ContentCategory::Film, &[18], 1)
            .await
            .unwrap();
        assert_eq!(items[0].genres, vec!["Drama"]);
    }

    #[tokio::test]
    async fn test_by_genre_requires_genres() {
        let service = service(provider()).await;
        let result = service.get_by_genre(ContentCategory::Film, &[], 1).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_genres_sorted_for_display() {
        let service = service(provider()).await;
        let genres = service.get_genres(ContentCategory::Film);
        assert_eq!(genres, vec![genre(28, "Action"), genre(18, "Drama")]);
    }

    #[tokio::test]
    async fn test_favorites_require_storage() {
        let service = service(provider()).await;
        assert!(!service.has_store());
        assert!(matches!(
            service.get_favorites(1, ContentCategory::Film).await,
            Err(AppError::StorageUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_favorites_resolve_through_provider() {
        let mut provider = provider();
        provider
            .expect_details()
            .times(2)
            .returning(|_, id| Ok(details(id, "Fav")));

        let mut store = MockContentStore::new();
        store
            .expect_favorite_ids()
            .withf(|user_id, category| *user_id == 7 && *category == ContentCategory::Film)
            .returning(|_, _| Ok(vec![100, 200]));

        let service = service(provider).await.with_store(Arc::new(store));
        let items = service
            .get_favorites(7, ContentCategory::Film)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_mirrors_genres_to_storage() {
        let mut store = MockContentStore::new();
        store
            .expect_save_genres()
            .times(2)
            .returning(|_, genres: &[Genre]| {
                assert_eq!(genres.len(), 2);
                Ok(())
            });

        let service = service(provider()).await.with_store(Arc::new(store));
        service.refresh_genres().await.unwrap();
    }

    #[test]
    fn test_dedup_preserving_order() {
        assert_eq!(dedup_preserving_order(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
