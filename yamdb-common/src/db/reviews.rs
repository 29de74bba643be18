//! Review store
//!
//! One review per (title, author) is enforced by the
//! `uniq_reviews_title_author` constraint; callers detect the duplicate with
//! [`crate::Error::is_unique_violation`].

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{Page, Review};
use crate::Result;

const REVIEW_SELECT: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
                             r.text, r.score, r.pub_date \
                             FROM reviews r JOIN users u ON u.id = r.author_id";

/// Reviews of a title, oldest first
pub async fn list(pool: &SqlitePool, title_id: i64, limit: i64, offset: i64) -> Result<Page<Review>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
        .bind(title_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, Review>(&format!(
        "{} WHERE r.title_id = ? ORDER BY r.pub_date, r.id LIMIT ? OFFSET ?",
        REVIEW_SELECT
    ))
    .bind(title_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { count, items })
}

/// Fetch a review only if it belongs to the given title
pub async fn get(pool: &SqlitePool, title_id: i64, review_id: i64) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "{} WHERE r.id = ? AND r.title_id = ?",
        REVIEW_SELECT
    ))
    .bind(review_id)
    .bind(title_id)
    .fetch_optional(pool)
    .await?;

    Ok(review)
}

pub async fn insert(
    pool: &SqlitePool,
    title_id: i64,
    author_id: i64,
    text: &str,
    score: i64,
) -> Result<Review> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reviews (title_id, author_id, text, score, pub_date) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(title_id)
    .bind(author_id)
    .bind(text)
    .bind(score)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    let review = sqlx::query_as::<_, Review>(&format!("{} WHERE r.id = ?", REVIEW_SELECT))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(review)
}

/// Change text and/or score; author, title and date never change
pub async fn update(
    pool: &SqlitePool,
    review_id: i64,
    text: Option<&str>,
    score: Option<i64>,
) -> Result<Option<Review>> {
    let result = sqlx::query(
        "UPDATE reviews SET text = COALESCE(?, text), score = COALESCE(?, score) WHERE id = ?",
    )
    .bind(text)
    .bind(score)
    .bind(review_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let review = sqlx::query_as::<_, Review>(&format!("{} WHERE r.id = ?", REVIEW_SELECT))
        .bind(review_id)
        .fetch_optional(pool)
        .await?;

    Ok(review)
}

pub async fn delete(pool: &SqlitePool, review_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
