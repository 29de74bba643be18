//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Permission tier of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Validation(format!("Invalid role: {}", other))),
        }
    }
}

/// Confirmation-code lifecycle of a user
///
/// `Pending` holds a live one-time code. `Consumed` means there is no live
/// code: it was exchanged for a token, or the account was created by an
/// administrator and never signed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AuthState {
    Pending,
    Consumed,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
    pub auth_state: AuthState,
    pub confirmation_code: Option<i64>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// Genre or category: both are a name plus a unique slug
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Title with its relations resolved and its rating computed at read time
#[derive(Debug, Clone)]
pub struct TitleDetail {
    pub title: Title,
    pub category: Option<CatalogEntry>,
    pub genres: Vec<CatalogEntry>,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: i64,
    pub title_id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub score: i64,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub title_id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

/// One page of a limit/offset listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: i64,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_only_known_values() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
    }

    #[test]
    fn test_superuser_counts_as_admin() {
        let user = User {
            id: 1,
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: Role::User,
            is_superuser: true,
            auth_state: AuthState::Consumed,
            confirmation_code: None,
        };
        assert!(user.is_admin());
        assert!(!user.is_moderator());
    }
}
