use std::collections::HashMap;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::ContentStore,
    error::{AppError, AppResult},
    models::{ContentCategory, Genre, User},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// [`ContentStore`] backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn content_ids(
        &self,
        table: MarkerTable,
        user_id: i64,
        category: ContentCategory,
    ) -> AppResult<Vec<i64>> {
        let sql = format!(
            "SELECT content_id FROM {} WHERE user_id = $1 AND category = $2 ORDER BY created_at",
            table.name()
        );

        let rows: Vec<(i64,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn insert_marker(
        &self,
        table: MarkerTable,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} (user_id, category, content_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, category, content_id) DO NOTHING",
            table.name()
        );

        sqlx::query(&sql)
            .bind(user_id)
            .bind(category.as_str())
            .bind(content_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let unknown_user = matches!(
                    &e,
                    sqlx::Error::Database(db) if db.is_foreign_key_violation()
                );
                if unknown_user {
                    AppError::NotFound(format!("user {}", user_id))
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum MarkerTable {
    Favorites,
    Viewed,
}

impl MarkerTable {
    fn name(self) -> &'static str {
        match self {
            MarkerTable::Favorites => "favorites",
            MarkerTable::Viewed => "viewed",
        }
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn genre_names(
        &self,
        category: ContentCategory,
        ids: &[i64],
    ) -> AppResult<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM genres WHERE category = $1 AND id = ANY($2)")
                .bind(category.as_str())
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        tracing::debug!(
            category = %category,
            requested = ids.len(),
            found = rows.len(),
            "Resolved genre names from storage"
        );

        Ok(rows.into_iter().collect())
    }

    async fn save_genres(&self, category: ContentCategory, genres: &[Genre]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for genre in genres {
            sqlx::query(
                "INSERT INTO genres (category, id, name) VALUES ($1, $2, $3) \
                 ON CONFLICT (category, id) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(category.as_str())
            .bind(genre.id)
            .bind(&genre.name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(category = %category, genres = genres.len(), "Persisted genres");
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username, updated_at = now()",
        )
        .bind(user.id)
        .bind(&user.username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn favorite_ids(&self, user_id: i64, category: ContentCategory) -> AppResult<Vec<i64>> {
        self.content_ids(MarkerTable::Favorites, user_id, category)
            .await
    }

    async fn add_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        self.insert_marker(MarkerTable::Favorites, user_id, category, content_id)
            .await
    }

    async fn remove_favorite(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND category = $2 AND content_id = $3")
            .bind(user_id)
            .bind(category.as_str())
            .bind(content_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn viewed_ids(&self, user_id: i64, category: ContentCategory) -> AppResult<Vec<i64>> {
        self.content_ids(MarkerTable::Viewed, user_id, category).await
    }

    async fn mark_viewed(
        &self,
        user_id: i64,
        category: ContentCategory,
        content_id: i64,
    ) -> AppResult<()> {
        self.insert_marker(MarkerTable::Viewed, user_id, category, content_id)
            .await
    }
}
