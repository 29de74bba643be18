//! Access token issuing and verification
//!
//! Tokens are HS256 JWTs. The signing secret is generated once and kept in
//! the `settings` table so tokens survive restarts.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::db::settings::{get_setting, set_setting, TOKEN_SIGNING_SECRET};
use crate::db::User;
use crate::{Error, Result};

const ACCESS_TOKEN_TYPE: &str = "access";
const MAX_TOKEN_LEN: usize = 2048;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: String,
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Unexpected token type: {0}")]
    WrongType(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, lifetime_secs: i64) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime_secs,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user.id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            user_id,
            iat: now.timestamp(),
            exp: now.timestamp() + self.lifetime_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Token(e.to_string()))
    }

    /// Check signature, algorithm and expiry, then the token type
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed("token exceeds max length".to_string()));
        }

        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::WrongType(claims.token_type));
        }

        Ok(claims)
    }
}

/// Load the token signing secret, generating and storing one if absent
pub async fn load_signing_secret(db: &SqlitePool) -> Result<String> {
    if let Some(secret) = get_setting(db, TOKEN_SIGNING_SECRET).await? {
        if !secret.is_empty() {
            return Ok(secret);
        }
    }
    initialize_signing_secret(db).await
}

/// Generate a random 256-bit secret and store it as hex
pub async fn initialize_signing_secret(db: &SqlitePool) -> Result<String> {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();

    set_setting(db, TOKEN_SIGNING_SECRET, &secret).await?;
    info!("Generated new token signing secret");

    Ok(secret)
}
