//! Signup and token exchange
//!
//! A user is `Pending` while an unconsumed confirmation code is stored and
//! `Consumed` once it has been exchanged for an access token. Only a new
//! signup moves a user back to `Pending`.

use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::api::TokenIssuer;
use crate::db::users::{self, NewUser};
use crate::db::{AuthState, Role, User};
use crate::mail::{ConfirmationMail, Mailer};
use crate::messages::{MessageKey, Messages};
use crate::validation::{self, RESERVED_USERNAME};
use crate::Result;

pub const CODE_MIN: i64 = 100_000;
pub const CODE_MAX: i64 = 999_999;

/// Fresh 6-digit confirmation code
pub fn generate_code() -> i64 {
    rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX)
}

/// Register `username`/`email` (or re-register the same pair) and mail a
/// fresh confirmation code.
///
/// The store write and the mail dispatch share one transaction: if the
/// mailer fails, nothing is committed.
pub async fn signup(
    pool: &SqlitePool,
    messages: &Messages,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
) -> Result<User> {
    if username == RESERVED_USERNAME {
        return Err(messages.validation(MessageKey::ReservedUsername));
    }
    validation::username(messages, username)?;
    validation::email(messages, email)?;

    let code = generate_code();
    let mut tx = pool.begin().await?;

    let by_username = users::find_by_username(&mut *tx, username).await?;
    let by_email = users::find_by_email(&mut *tx, email).await?;

    let user = match (by_username, by_email) {
        (Some(existing), Some(same)) if existing.id == same.id => {
            debug!("Re-issuing confirmation code for {}", existing.username);
            users::set_pending_code(&mut *tx, existing.id, code).await?
        }
        (Some(_), _) => return Err(messages.validation(MessageKey::UsernameTaken)),
        (None, Some(_)) => return Err(messages.validation(MessageKey::EmailTaken)),
        (None, None) => {
            let new = NewUser {
                username: username.to_string(),
                email: email.to_string(),
                ..NewUser::default()
            };
            users::insert(&mut *tx, &new, AuthState::Pending, Some(code))
                .await
                .map_err(|e| {
                    if e.is_unique_violation() {
                        messages.validation(MessageKey::UsernameTaken)
                    } else {
                        e
                    }
                })?
        }
    };

    mailer.send(&ConfirmationMail::new(messages, &user.email, code))?;
    tx.commit().await?;

    info!("Confirmation code sent to {} for {}", user.email, user.username);
    Ok(user)
}

/// Exchange a confirmation code for an access token.
///
/// `code` is `None` when the submitted value was not a number; it is then
/// treated as a wrong code.
pub async fn token(
    pool: &SqlitePool,
    messages: &Messages,
    issuer: &TokenIssuer,
    username: &str,
    code: Option<i64>,
) -> Result<String> {
    validation::required(messages, "username", username)?;

    let user = users::find_by_username(pool, username)
        .await?
        .ok_or_else(|| messages.not_found(MessageKey::UserNotFound))?;

    if user.auth_state == AuthState::Consumed {
        return Err(messages.validation(MessageKey::CodeAlreadyUsed));
    }

    let Some(code) = code else {
        return Err(messages.validation(MessageKey::WrongCode));
    };
    if user.confirmation_code != Some(code) {
        return Err(messages.validation(MessageKey::WrongCode));
    }

    // A concurrent request may have consumed the code since the read above
    if !users::consume_code(pool, user.id, code).await? {
        return Err(messages.validation(MessageKey::CodeAlreadyUsed));
    }

    let token = issuer.issue(&user)?;
    info!("Issued access token for {}", user.username);
    Ok(token)
}

/// Create an admin-role superuser in `Pending` state and mail its code
pub async fn create_superuser(
    pool: &SqlitePool,
    messages: &Messages,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
) -> Result<User> {
    validation::username(messages, username)?;
    validation::email(messages, email)?;

    let code = generate_code();
    let mut tx = pool.begin().await?;

    if users::find_by_username(&mut *tx, username).await?.is_some() {
        return Err(messages.validation(MessageKey::UsernameTaken));
    }
    if users::find_by_email(&mut *tx, email).await?.is_some() {
        return Err(messages.validation(MessageKey::EmailTaken));
    }

    let new = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        role: Role::Admin,
        is_superuser: true,
        ..NewUser::default()
    };
    let user = users::insert(&mut *tx, &new, AuthState::Pending, Some(code)).await?;

    mailer.send(&ConfirmationMail::new(messages, &user.email, code))?;
    tx.commit().await?;

    info!("Created superuser {}", user.username);
    Ok(user)
}
