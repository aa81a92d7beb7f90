//! Shared helpers for integration tests: a wiremock TMDB and a service wired to it

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cinefetch::services::{ContentService, Converter, Dispatcher, TmdbProvider};

pub const API_KEY: &str = "test-api-key";
pub const LANGUAGE: &str = "ru-RU";
pub const IMAGE_BASE_URL: &str = "https://img.test/t/p/original";

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mounts genre lists for both categories
pub async fn mount_genre_lists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                { "id": 18, "name": "драма" },
                { "id": 28, "name": "боевик" },
                { "id": 878, "name": "фантастика" }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/genre/tv/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                { "id": 18, "name": "драма" },
                { "id": 10765, "name": "НФ и Фэнтези" }
            ]
        })))
        .mount(server)
        .await;
}

pub fn provider_for(server: &MockServer) -> TmdbProvider {
    TmdbProvider::new(
        API_KEY.to_string(),
        server.uri(),
        LANGUAGE.to_string(),
        Duration::from_secs(5),
    )
    .expect("Failed to build provider")
}

/// Builds a service against `server`; genre lists must already be mounted
pub async fn service_for(server: &MockServer) -> ContentService {
    ContentService::new(
        Arc::new(provider_for(server)),
        Converter::new(IMAGE_BASE_URL, LANGUAGE),
        Dispatcher::new(3),
    )
    .await
    .expect("Failed to build content service")
}

pub fn movie_details(id: i64, title: &str, release_date: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "original_title": title,
        "overview": format!("Описание {}", title),
        "popularity": 42.5,
        "poster_path": "/poster.jpg",
        "backdrop_path": null,
        "release_date": release_date,
        "vote_average": 7.9,
        "vote_count": 1200,
        "genres": [{ "id": 18, "name": "драма" }],
        "production_countries": [{ "iso_3166_1": "US" }],
        "videos": {
            "results": [
                { "key": "abc123", "site": "YouTube", "type": "Trailer", "iso_3166_1": "RU" }
            ]
        }
    })
}

pub fn list_item(id: i64, title: &str, overview: &str, release_date: &str, popularity: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "original_title": title,
        "overview": overview,
        "popularity": popularity,
        "poster_path": null,
        "release_date": release_date,
        "vote_average": 6.5,
        "vote_count": 100,
        "genre_ids": [18, 878]
    })
}

pub fn page_of(results: Vec<Value>) -> Value {
    json!({
        "page": 1,
        "total_pages": 1,
        "total_results": results.len(),
        "results": results
    })
}
