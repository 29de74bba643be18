//! User store
//!
//! Lookups are generic over the executor so the signup flow can run them
//! inside its transaction.

use sqlx::{Executor, Sqlite, SqlitePool};

use super::models::{AuthState, Page, Role, User};
use crate::Result;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, \
                            is_superuser, auth_state, confirmation_code";

/// Fields of a user about to be inserted
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

pub async fn find_by_username<'e, E>(executor: E, username: &str) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(executor)
            .await?;

    Ok(user)
}

/// Users ordered by username, optionally filtered by a username substring
pub async fn list(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Page<User>> {
    let pattern = search.map(super::contains_pattern);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR username LIKE ?1 ESCAPE '\\')",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE (?1 IS NULL OR username LIKE ?1 ESCAPE '\\') \
         ORDER BY username LIMIT ?2 OFFSET ?3",
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { count, items })
}

pub async fn insert<'e, E>(
    executor: E,
    new: &NewUser,
    auth_state: AuthState,
    confirmation_code: Option<i64>,
) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users \
         (username, email, first_name, last_name, bio, role, is_superuser, auth_state, confirmation_code) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.bio)
    .bind(new.role)
    .bind(new.is_superuser)
    .bind(auth_state)
    .bind(confirmation_code)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Apply a partial update; returns `None` if the user does not exist
pub async fn update(pool: &SqlitePool, id: i64, changes: &UserChanges) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET \
         username = COALESCE(?, username), \
         email = COALESCE(?, email), \
         first_name = COALESCE(?, first_name), \
         last_name = COALESCE(?, last_name), \
         bio = COALESCE(?, bio), \
         role = COALESCE(?, role), \
         updated_at = CURRENT_TIMESTAMP \
         WHERE id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&changes.username)
    .bind(&changes.email)
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.bio)
    .bind(changes.role)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Store a fresh confirmation code and move the user to `Pending`
pub async fn set_pending_code<'e, E>(executor: E, id: i64, code: i64) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET auth_state = ?, confirmation_code = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(AuthState::Pending)
    .bind(code)
    .bind(id)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Consume a pending code. The guarded UPDATE lets exactly one of two
/// concurrent token requests win; the loser sees `false`.
pub async fn consume_code(pool: &SqlitePool, id: i64, code: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET auth_state = ?, confirmation_code = NULL, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ? AND auth_state = ? AND confirmation_code = ?",
    )
    .bind(AuthState::Consumed)
    .bind(id)
    .bind(AuthState::Pending)
    .bind(code)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
