//! Comment store

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{Comment, Page};
use crate::Result;

const COMMENT_SELECT: &str = "SELECT c.id, c.review_id, c.title_id, c.author_id, \
                              u.username AS author, c.text, c.pub_date \
                              FROM comments c JOIN users u ON u.id = c.author_id";

/// Comments on a review, oldest first
pub async fn list(
    pool: &SqlitePool,
    review_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Page<Comment>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
        .bind(review_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, Comment>(&format!(
        "{} WHERE c.review_id = ? ORDER BY c.pub_date, c.id LIMIT ? OFFSET ?",
        COMMENT_SELECT
    ))
    .bind(review_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { count, items })
}

/// Fetch a comment only if it belongs to the given review
pub async fn get(pool: &SqlitePool, review_id: i64, comment_id: i64) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "{} WHERE c.id = ? AND c.review_id = ?",
        COMMENT_SELECT
    ))
    .bind(comment_id)
    .bind(review_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

pub async fn insert(
    pool: &SqlitePool,
    review_id: i64,
    title_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO comments (review_id, title_id, author_id, text, pub_date) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(review_id)
    .bind(title_id)
    .bind(author_id)
    .bind(text)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    let comment = sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(comment)
}

pub async fn update(pool: &SqlitePool, comment_id: i64, text: &str) -> Result<Option<Comment>> {
    let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(text)
        .bind(comment_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let comment = sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
        .bind(comment_id)
        .fetch_optional(pool)
        .await?;

    Ok(comment)
}

pub async fn delete(pool: &SqlitePool, comment_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
