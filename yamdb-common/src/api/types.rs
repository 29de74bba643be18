//! API request/response types
//!
//! Every operation has its own request and response shape; nothing switches
//! serializers at runtime. Request fields default to empty so that missing
//! values surface as validation errors with a readable message rather than
//! as body-parsing failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::{CatalogEntry, Comment, Review, Role, TitleDetail, User};

// ========================================
// Auth
// ========================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

/// Public fields of a freshly signed-up user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

/// Confirmation code as submitted: clients send it either as a JSON number
/// or as a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CodeInput {
    Number(i64),
    Text(String),
}

impl CodeInput {
    pub fn as_code(&self) -> Option<i64> {
        match self {
            CodeInput::Number(n) => Some(*n),
            CodeInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: Option<CodeInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// ========================================
// Users
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.role,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// Admin creates a user
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Option<String>,
}

/// Admin edits any user, role included
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

/// A user edits their own profile. There is no `role` field: a submitted
/// role is dropped during deserialization and the stored one is kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelfUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl From<SelfUpdateRequest> for UserUpdateRequest {
    fn from(request: SelfUpdateRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            bio: request.bio,
            role: None,
        }
    }
}

// ========================================
// Catalog
// ========================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogRequest {
    pub name: String,
    pub slug: String,
}

/// Title writes; genres and category are referenced by slug. For
/// `description` and `category` an absent field is `None` and an explicit
/// `null` is `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TitleWriteRequest {
    pub name: Option<String>,
    pub year: Option<i64>,
    #[serde(deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub genre: Option<Vec<String>>,
    #[serde(deserialize_with = "present")]
    pub category: Option<Option<String>>,
}

/// Wraps any value that is present in the payload, `null` included
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleResponse {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub genre: Vec<CatalogEntry>,
    pub category: Option<CatalogEntry>,
    pub rating: Option<i64>,
}

impl From<TitleDetail> for TitleResponse {
    fn from(detail: TitleDetail) -> Self {
        Self {
            id: detail.title.id,
            name: detail.title.name,
            year: detail.title.year,
            description: detail.title.description,
            genre: detail.genres,
            category: detail.category,
            rating: detail.rating,
        }
    }
}

// ========================================
// Reviews and comments
// ========================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewRequest {
    pub text: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub score: i64,
    pub pub_date: DateTime<Utc>,
    pub title: i64,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            text: review.text,
            author: review.author,
            score: review.score,
            pub_date: review.pub_date,
            title: review.title_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
    pub review: i64,
    pub title: i64,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
            review: comment.review_id,
            title: comment.title_id,
        }
    }
}

// ========================================
// Listing and errors
// ========================================

/// Limit/offset page envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Error body: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_input_accepts_number_and_string() {
        let request: TokenRequest =
            serde_json::from_str(r#"{"username": "a", "confirmation_code": 123456}"#).unwrap();
        assert_eq!(request.confirmation_code.unwrap().as_code(), Some(123456));

        let request: TokenRequest =
            serde_json::from_str(r#"{"username": "a", "confirmation_code": "654321"}"#).unwrap();
        assert_eq!(request.confirmation_code.unwrap().as_code(), Some(654321));

        let request: TokenRequest =
            serde_json::from_str(r#"{"username": "a", "confirmation_code": "abc"}"#).unwrap();
        assert_eq!(request.confirmation_code.unwrap().as_code(), None);
    }

    #[test]
    fn test_self_update_drops_role() {
        let request: SelfUpdateRequest =
            serde_json::from_str(r#"{"bio": "hi", "role": "admin"}"#).unwrap();
        let update: UserUpdateRequest = request.into();

        assert_eq!(update.bio.as_deref(), Some("hi"));
        assert_eq!(update.role, None);
    }

    #[test]
    fn test_title_write_distinguishes_null_from_absent() {
        let request: TitleWriteRequest =
            serde_json::from_str(r#"{"category": null, "description": "x"}"#).unwrap();
        assert_eq!(request.category, Some(None));
        assert_eq!(request.description, Some(Some("x".to_string())));

        let request: TitleWriteRequest = serde_json::from_str(r#"{"name": "Heat"}"#).unwrap();
        assert_eq!(request.category, None);
        assert_eq!(request.description, None);
    }

    #[test]
    fn test_catalog_entry_hides_id() {
        let entry = CatalogEntry {
            id: 7,
            name: "Drama".to_string(),
            slug: "drama".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json, serde_json::json!({"name": "Drama", "slug": "drama"}));
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new("not_found", "Title not found.")).unwrap();

        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "Title not found.");
    }
}
