//! Title store
//!
//! Titles are read back as [`TitleDetail`] with category, genres and rating
//! resolved. The rating is never stored; it is aggregated from the current
//! review scores on every read.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::models::{CatalogEntry, Page, Title, TitleDetail};
use crate::rating;
use crate::{Error, Result};

/// Listing filters; all are optional and combine with AND
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    /// Genre slug
    pub genre: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Substring of the title name
    pub name: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub genre_ids: Vec<i64>,
}

/// Partial update; `None` keeps the stored value. `Some(None)` clears the
/// nullable columns. `genre_ids` replaces the whole genre set when present.
#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<i64>>,
    pub genre_ids: Option<Vec<i64>>,
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a TitleFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(genre) = &filter.genre {
        qb.push(
            " AND t.id IN (SELECT gt.title_id FROM genre_title gt \
             JOIN genres g ON g.id = gt.genre_id WHERE g.slug = ",
        );
        qb.push_bind(genre.as_str());
        qb.push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND t.category_id IN (SELECT id FROM categories WHERE slug = ");
        qb.push_bind(category.as_str());
        qb.push(")");
    }
    if let Some(name) = &filter.name {
        qb.push(" AND t.name LIKE ");
        qb.push_bind(super::contains_pattern(name));
        qb.push(" ESCAPE '\\'");
    }
    if let Some(year) = filter.year {
        qb.push(" AND t.year = ");
        qb.push_bind(year);
    }
}

/// Titles ordered by name
pub async fn list(
    pool: &SqlitePool,
    filter: &TitleFilter,
    limit: i64,
    offset: i64,
) -> Result<Page<TitleDetail>> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM titles t");
    push_filters(&mut count_query, filter);
    let count = count_query.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut list_query = QueryBuilder::<Sqlite>::new(
        "SELECT t.id, t.name, t.year, t.description, t.category_id FROM titles t",
    );
    push_filters(&mut list_query, filter);
    list_query.push(" ORDER BY t.name, t.id LIMIT ");
    list_query.push_bind(limit);
    list_query.push(" OFFSET ");
    list_query.push_bind(offset);

    let titles = list_query.build_query_as::<Title>().fetch_all(pool).await?;

    let mut items = Vec::with_capacity(titles.len());
    for title in titles {
        items.push(hydrate(pool, title).await?);
    }

    Ok(Page { count, items })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<TitleDetail>> {
    let title = sqlx::query_as::<_, Title>(
        "SELECT id, name, year, description, category_id FROM titles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match title {
        Some(title) => Ok(Some(hydrate(pool, title).await?)),
        None => Ok(None),
    }
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM titles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

pub async fn insert(pool: &SqlitePool, new: &NewTitle) -> Result<TitleDetail> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO titles (name, year, description, category_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&new.name)
    .bind(new.year)
    .bind(&new.description)
    .bind(new.category_id)
    .fetch_one(&mut *tx)
    .await?;

    replace_genres(&mut tx, id, &new.genre_ids).await?;
    tx.commit().await?;

    get(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Title {} vanished after insert", id)))
}

/// Apply a partial update; returns `None` if the title does not exist
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    changes: &TitleChanges,
) -> Result<Option<TitleDetail>> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE titles SET \
         name = COALESCE(?, name), \
         year = COALESCE(?, year), \
         description = CASE WHEN ? THEN ? ELSE description END, \
         category_id = CASE WHEN ? THEN ? ELSE category_id END \
         WHERE id = ?",
    )
    .bind(&changes.name)
    .bind(changes.year)
    .bind(changes.description.is_some())
    .bind(changes.description.as_ref().and_then(|d| d.as_deref()))
    .bind(changes.category_id.is_some())
    .bind(changes.category_id.flatten())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(genre_ids) = &changes.genre_ids {
        replace_genres(&mut tx, id, genre_ids).await?;
    }
    tx.commit().await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM titles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Mean review score of a title, truncated toward zero; `None` without reviews
pub async fn rating(pool: &SqlitePool, title_id: i64) -> Result<Option<i64>> {
    let mean: Option<f64> = sqlx::query_scalar("SELECT AVG(score) FROM reviews WHERE title_id = ?")
        .bind(title_id)
        .fetch_one(pool)
        .await?;

    Ok(rating::from_mean(mean))
}

async fn replace_genres(conn: &mut SqliteConnection, title_id: i64, genre_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM genre_title WHERE title_id = ?")
        .bind(title_id)
        .execute(&mut *conn)
        .await?;

    for genre_id in genre_ids {
        sqlx::query("INSERT OR IGNORE INTO genre_title (title_id, genre_id) VALUES (?, ?)")
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn hydrate(pool: &SqlitePool, title: Title) -> Result<TitleDetail> {
    let category = match title.category_id {
        Some(category_id) => {
            sqlx::query_as::<_, CatalogEntry>("SELECT id, name, slug FROM categories WHERE id = ?")
                .bind(category_id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let genres = sqlx::query_as::<_, CatalogEntry>(
        "SELECT g.id, g.name, g.slug FROM genres g \
         JOIN genre_title gt ON gt.genre_id = g.id \
         WHERE gt.title_id = ? ORDER BY g.name",
    )
    .bind(title.id)
    .fetch_all(pool)
    .await?;

    let rating = rating(pool, title.id).await?;

    Ok(TitleDetail {
        title,
        category,
        genres,
        rating,
    })
}
