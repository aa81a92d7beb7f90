use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{ContentCategory, ContentItem, Genre, User},
};

use super::extract::{ApiPath, ApiQuery};
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    pub ids: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub genres: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkerRequest {
    pub content_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub count: usize,
    pub items: Vec<ContentItem>,
}

impl From<Vec<ContentItem>> for ContentResponse {
    fn from(items: Vec<ContentItem>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

fn default_page() -> u32 {
    1
}

/// Parses a comma-separated id list (`1,2, 3`)
fn parse_id_list(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid id: {}", part)))
        })
        .collect()
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

pub async fn get_items(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(category): ApiPath<ContentCategory>,
    ApiQuery(query): ApiQuery<IdsQuery>,
) -> AppResult<Json<ContentResponse>> {
    let ids = parse_id_list(&query.ids)?;
    if ids.is_empty() {
        return Err(AppError::InvalidInput("No ids given".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        category = %category,
        ids = ids.len(),
        "Processing content lookup"
    );

    let items = state.content.get_by_ids(category, ids).await?;
    Ok(Json(items.into()))
}

pub async fn get_popular(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<ContentCategory>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<ContentResponse>> {
    let items = state.content.get_popular(category, query.page).await?;
    Ok(Json(items.into()))
}

pub async fn get_top_rated(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<ContentCategory>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<ContentResponse>> {
    let items = state.content.get_top_rated(category, query.page).await?;
    Ok(Json(items.into()))
}

pub async fn discover(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<ContentCategory>,
    ApiQuery(query): ApiQuery<DiscoverQuery>,
) -> AppResult<Json<ContentResponse>> {
    let genre_ids = parse_id_list(&query.genres)?;
    let items = state
        .content
        .get_by_genre(category, &genre_ids, query.page)
        .await?;
    Ok(Json(items.into()))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(category): ApiPath<ContentCategory>,
    ApiQuery(query): ApiQuery<IdsQuery>,
) -> AppResult<Json<ContentResponse>> {
    let seeds = parse_id_list(&query.ids)?;

    tracing::info!(
        request_id = %request_id,
        category = %category,
        seeds = seeds.len(),
        "Processing recommendation request"
    );

    let items = state.content.get_recommendations(category, seeds).await?;
    Ok(Json(items.into()))
}

pub async fn get_genres(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<ContentCategory>,
) -> Json<Vec<Genre>> {
    Json(state.content.get_genres(category))
}

/// Title search across both categories; `q` may hold several titles separated by `|`
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<ContentResponse>> {
    let titles = query.q.split('|').map(str::to_string).collect();
    let items = state.content.search_by_title(titles).await?;
    Ok(Json(items.into()))
}

pub async fn register_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    Json(request): Json<RegisterUserRequest>,
) -> AppResult<StatusCode> {
    let user = User {
        id: user_id,
        username: request.username,
    };
    state.content.register_user(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_favorites(
    State(state): State<AppState>,
    ApiPath((user_id, category)): ApiPath<(i64, ContentCategory)>,
) -> AppResult<Json<ContentResponse>> {
    let items = state.content.get_favorites(user_id, category).await?;
    Ok(Json(items.into()))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    ApiPath((user_id, category)): ApiPath<(i64, ContentCategory)>,
    Json(request): Json<MarkerRequest>,
) -> AppResult<StatusCode> {
    state
        .content
        .add_favorite(user_id, category, request.content_id)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    ApiPath((user_id, category, content_id)): ApiPath<(i64, ContentCategory, i64)>,
) -> AppResult<StatusCode> {
    state
        .content
        .remove_favorite(user_id, category, content_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_viewed(
    State(state): State<AppState>,
    ApiPath((user_id, category)): ApiPath<(i64, ContentCategory)>,
) -> AppResult<Json<ContentResponse>> {
    let items = state.content.get_viewed(user_id, category).await?;
    Ok(Json(items.into()))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    ApiPath((user_id, category)): ApiPath<(i64, ContentCategory)>,
    Json(request): Json<MarkerRequest>,
) -> AppResult<StatusCode> {
    state
        .content
        .mark_viewed(user_id, category, request.content_id)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn refresh_genres(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.content.refresh_genres().await?;
    Ok(StatusCode::NO_CONTENT)
}
