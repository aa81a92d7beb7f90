/// TMDB v3 provider
///
/// API Flow:
/// 1. Details: /{movie|tv}/{id}?append_to_response=videos
/// 2. Listings: /{movie|tv}/popular, /{movie|tv}/top_rated, /{movie|tv}/{id}/recommendations
/// 3. Search: /search/{movie|tv}?query=...
/// 4. Discover: /discover/{movie|tv}?with_genres=18,35
/// 5. Genres: /genre/{movie|tv}/list
///
/// Every request carries the configured `language`; paged requests add `page`.
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{ContentCategory, DetailsResponse, Genre, GenreListResponse, ListItem, Page},
    services::providers::MetadataProvider,
};

/// Query parameters stamped on an outgoing request.
///
/// The provider keeps one base value (locale) and derives a fresh copy per call;
/// the `with_*` methods never modify `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    language: String,
    page: Option<u32>,
    params: Vec<(&'static str, String)>,
}

impl RequestOptions {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            page: None,
            params: Vec::new(),
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    pub fn with_param(&self, key: &'static str, value: impl Into<String>) -> Self {
        let mut params = self.params.clone();
        params.push((key, value.into()));
        Self {
            params,
            ..self.clone()
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Query pairs in a stable order: api key, language, page, extra params
    pub fn to_query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", api_key.to_string()),
            ("language", self.language.clone()),
        ];
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        query.extend(self.params.iter().cloned());
        query
    }
}

#[derive(Debug, Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    base_options: RequestOptions,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        language: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            base_options: RequestOptions::new(language),
        })
    }

    pub fn base_options(&self) -> &RequestOptions {
        &self.base_options
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, path);

        tracing::debug!(
            path = %path,
            language = %options.language(),
            page = ?options.page(),
            "Calling TMDB"
        );

        let response = self
            .http_client
            .get(&url)
            .query(&options.to_query(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                path = %path,
                error = %e,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn details(&self, category: ContentCategory, id: i64) -> AppResult<DetailsResponse> {
        let path = format!("{}/{}", category.provider_segment(), id);
        let options = self
            .base_options
            .with_param("append_to_response", "videos");
        self.get_json(&path, options).await
    }

    async fn popular(&self, category: ContentCategory, page: u32) -> AppResult<Page<ListItem>> {
        let path = format!("{}/popular", category.provider_segment());
        self.get_json(&path, self.base_options.with_page(page)).await
    }

    async fn top_rated(&self, category: ContentCategory, page: u32) -> AppResult<Page<ListItem>> {
        let path = format!("{}/top_rated", category.provider_segment());
        self.get_json(&path, self.base_options.with_page(page)).await
    }

    async fn recommendations(
        &self,
        category: ContentCategory,
        id: i64,
    ) -> AppResult<Page<ListItem>> {
        let path = format!("{}/{}/recommendations", category.provider_segment(), id);
        self.get_json(&path, self.base_options.with_page(1)).await
    }

    async fn search(&self, category: ContentCategory, title: &str) -> AppResult<Page<ListItem>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let path = format!("search/{}", category.provider_segment());
        let options = self.base_options.with_param("query", title);
        self.get_json(&path, options).await
    }

    async fn discover(
        &self,
        category: ContentCategory,
        genre_ids: &[i64],
        page: u32,
    ) -> AppResult<Page<ListItem>> {
        let with_genres = genre_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!("discover/{}", category.provider_segment());
        let options = self
            .base_options
            .with_page(page)
            .with_param("with_genres", with_genres)
            .with_param("sort_by", "popularity.desc");
        self.get_json(&path, options).await
    }

    async fn genres(&self, category: ContentCategory) -> AppResult<Vec<Genre>> {
        let path = format!("genre/{}/list", category.provider_segment());
        let response: GenreListResponse = self.get_json(&path, self.base_options.clone()).await?;

        tracing::info!(
            category = %category,
            genres = response.genres.len(),
            provider = "tmdb",
            "Genre list fetched"
        );

        Ok(response.genres)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
