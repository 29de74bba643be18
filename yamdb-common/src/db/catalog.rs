//! Genre and category store
//!
//! Both catalogs have the same shape, so one set of queries serves them with
//! the table picked by [`CatalogKind`].

use sqlx::{Executor, Sqlite, SqlitePool};

use super::models::{CatalogEntry, Page};
use crate::messages::MessageKey;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Genre,
    Category,
}

impl CatalogKind {
    fn table(&self) -> &'static str {
        match self {
            CatalogKind::Genre => "genres",
            CatalogKind::Category => "categories",
        }
    }

    pub fn not_found_key(&self) -> MessageKey {
        match self {
            CatalogKind::Genre => MessageKey::GenreNotFound,
            CatalogKind::Category => MessageKey::CategoryNotFound,
        }
    }
}

/// Entries ordered by name, optionally filtered by a name substring
pub async fn list(
    pool: &SqlitePool,
    kind: CatalogKind,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Page<CatalogEntry>> {
    let pattern = search.map(super::contains_pattern);

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')",
        kind.table()
    ))
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, CatalogEntry>(&format!(
        "SELECT id, name, slug FROM {} WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\') \
         ORDER BY name, id LIMIT ?2 OFFSET ?3",
        kind.table()
    ))
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { count, items })
}

pub async fn find_by_slug<'e, E>(
    executor: E,
    kind: CatalogKind,
    slug: &str,
) -> Result<Option<CatalogEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry = sqlx::query_as::<_, CatalogEntry>(&format!(
        "SELECT id, name, slug FROM {} WHERE slug = ?",
        kind.table()
    ))
    .bind(slug)
    .fetch_optional(executor)
    .await?;

    Ok(entry)
}

/// Insert an entry; a duplicate slug surfaces as a unique violation
pub async fn insert(
    pool: &SqlitePool,
    kind: CatalogKind,
    name: &str,
    slug: &str,
) -> Result<CatalogEntry> {
    let entry = sqlx::query_as::<_, CatalogEntry>(&format!(
        "INSERT INTO {} (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        kind.table()
    ))
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(entry)
}

pub async fn delete_by_slug(pool: &SqlitePool, kind: CatalogKind, slug: &str) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = ?", kind.table()))
        .bind(slug)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
